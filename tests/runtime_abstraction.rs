//! Integration tests for worker runtime abstraction

use route_preview::{MockSpawner, ThreadSpawner, WorkerSpawner};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

#[test]
fn test_mock_spawner_integration() {
    let spawner = MockSpawner::blocking();

    let executed = Arc::new(AtomicBool::new(false));
    let executed_clone = Arc::clone(&executed);

    spawner.spawn(
        "route",
        Box::new(move || {
            executed_clone.store(true, Ordering::SeqCst);
        }),
    );

    // In blocking mode, should execute immediately
    assert!(executed.load(Ordering::SeqCst));
}

#[test]
fn test_spawner_trait_bound() {
    fn spawn_task<S: WorkerSpawner>(spawner: &S) {
        spawner.spawn("package", Box::new(|| {}));
    }

    let spawner = MockSpawner::new();
    spawn_task(&spawner);
    assert_eq!(spawner.runtime_name(), "Mock");
}

#[test]
fn test_deferred_spawner_holds_tasks() {
    let spawner = MockSpawner::deferred();
    let count = Arc::new(AtomicUsize::new(0));

    for _ in 0..3 {
        let count = Arc::clone(&count);
        spawner.spawn(
            "route",
            Box::new(move || {
                count.fetch_add(1, Ordering::SeqCst);
            }),
        );
    }
    assert_eq!(count.load(Ordering::SeqCst), 0);
    assert_eq!(spawner.run_all(), 3);
    assert_eq!(count.load(Ordering::SeqCst), 3);
}

#[test]
fn test_thread_spawner_lanes_are_separate_threads() {
    let spawner = ThreadSpawner::new();
    let (tx, rx) = mpsc::channel();

    for lane in ["route", "package"] {
        let tx = tx.clone();
        spawner.spawn(
            lane,
            Box::new(move || {
                let name = std::thread::current().name().map(str::to_string);
                tx.send(name).unwrap();
            }),
        );
    }

    let mut names: Vec<_> = (0..2)
        .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap().unwrap())
        .collect();
    names.sort();
    assert_eq!(names, ["package-worker", "route-worker"]);
}

#[cfg(feature = "runtime-tokio")]
#[tokio::test]
async fn test_tokio_spawner_integration() {
    use route_preview::TokioSpawner;

    let spawner = TokioSpawner::current().expect("inside a runtime");
    let (tx, rx) = mpsc::channel();
    spawner.spawn(
        "route",
        Box::new(move || {
            tx.send(7).unwrap();
        }),
    );

    let value = tokio::task::spawn_blocking(move || rx.recv_timeout(Duration::from_secs(5)))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(value, 7);
    assert_eq!(spawner.runtime_name(), "Tokio");
}
