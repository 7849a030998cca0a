//! Worker execution contexts
//!
//! The loader never runs jobs on the caller's thread. It hands each job to a
//! [`WorkerSpawner`] together with the name of its lane (one lane per job
//! kind), and the spawner decides where the job runs.

pub mod mock;
pub mod thread_impl;
#[cfg(feature = "runtime-tokio")]
pub mod tokio_impl;

use std::fmt::Debug;

/// A unit of work handed to a worker lane
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Spawns jobs onto worker lanes
///
/// Implementations may run tasks of different lanes in parallel. Tasks of the
/// same lane are serialized by the loader regardless of the spawner.
///
/// # Example
/// ```ignore
/// let spawner = ThreadSpawner::new();
/// spawner.spawn("route", Box::new(|| {
///     // Blocking work here
/// }));
/// ```
pub trait WorkerSpawner: Send + Sync + Debug {
    /// Run `task` on the worker context of `lane`
    fn spawn(&self, lane: &'static str, task: Task);

    /// Get the name of this runtime (for debugging)
    fn runtime_name(&self) -> &'static str;
}

pub use mock::{MockSpawnBehavior, MockSpawner};
pub use thread_impl::ThreadSpawner;

#[cfg(feature = "runtime-tokio")]
pub use tokio_impl::TokioSpawner;
