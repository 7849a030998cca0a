//! Tokio async runtime implementation
//!
//! Jobs run on Tokio's blocking pool, since parsing and decoding are
//! synchronous file work.

use super::{Task, WorkerSpawner};
use tokio::runtime::Handle;

/// Tokio-based worker spawner
#[derive(Clone, Debug)]
pub struct TokioSpawner {
    handle: Handle,
}

impl TokioSpawner {
    /// Spawner bound to the runtime of the calling context
    ///
    /// Returns `None` outside of a Tokio runtime.
    pub fn current() -> Option<Self> {
        Handle::try_current().ok().map(Self::with_handle)
    }

    pub fn with_handle(handle: Handle) -> Self {
        Self { handle }
    }
}

impl WorkerSpawner for TokioSpawner {
    fn spawn(&self, lane: &'static str, task: Task) {
        log::debug!("Spawning {lane} job on the Tokio blocking pool");
        // Completion is reported through the loader's event channel
        drop(self.handle.spawn_blocking(task));
    }

    fn runtime_name(&self) -> &'static str {
        "Tokio"
    }
}
