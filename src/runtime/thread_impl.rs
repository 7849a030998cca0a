//! Dedicated worker thread per lane

use super::{Task, WorkerSpawner};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::mpsc::{self, Sender};

/// Runs every lane on its own long-lived OS thread
///
/// Threads are started on the first task of a lane and process that lane's
/// tasks in submission order. They exit when the spawner is dropped.
#[derive(Debug, Default)]
pub struct ThreadSpawner {
    lanes: Mutex<HashMap<&'static str, Sender<Task>>>,
}

impl ThreadSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    fn start_lane(lane: &'static str) -> Option<Sender<Task>> {
        let (tx, rx) = mpsc::channel::<Task>();
        let spawned = std::thread::Builder::new()
            .name(format!("{lane}-worker"))
            .spawn(move || {
                for task in rx {
                    task();
                }
                log::debug!("Worker lane {lane} shut down");
            });

        match spawned {
            Ok(_) => Some(tx),
            Err(e) => {
                log::error!("Failed to start worker lane {lane}: {e}");
                None
            }
        }
    }
}

impl WorkerSpawner for ThreadSpawner {
    fn spawn(&self, lane: &'static str, task: Task) {
        let mut lanes = self.lanes.lock();

        let task = match lanes.get(lane) {
            Some(tx) => match tx.send(task) {
                Ok(()) => return,
                // The lane thread is gone; start a fresh one below
                Err(mpsc::SendError(task)) => task,
            },
            None => task,
        };

        if let Some(tx) = Self::start_lane(lane) {
            if tx.send(task).is_ok() {
                lanes.insert(lane, tx);
            }
        }
    }

    fn runtime_name(&self) -> &'static str {
        "Thread"
    }
}
