//! Mock worker spawner for testing
//!
//! Runs tasks inline, holds them until the test releases them, or drops them
//! entirely.

use super::{Task, WorkerSpawner};
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Spawn behavior for MockSpawner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockSpawnBehavior {
    /// Drop tasks immediately (don't execute)
    Drop,
    /// Run tasks synchronously on the spawning thread
    BlockSync,
    /// Queue tasks until [`MockSpawner::run_next`] or [`MockSpawner::run_last`]
    Deferred,
}

/// Mock worker spawner for testing
pub struct MockSpawner {
    behavior: MockSpawnBehavior,
    pending: Mutex<VecDeque<(&'static str, Task)>>,
}

impl std::fmt::Debug for MockSpawner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSpawner")
            .field("behavior", &self.behavior)
            .field("pending", &self.pending_count())
            .finish()
    }
}

impl Default for MockSpawner {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSpawner {
    /// Create a new mock spawner that drops tasks
    pub fn new() -> Self {
        Self::with_behavior(MockSpawnBehavior::Drop)
    }

    pub fn with_behavior(behavior: MockSpawnBehavior) -> Self {
        Self {
            behavior,
            pending: Mutex::new(VecDeque::new()),
        }
    }

    /// Create a mock spawner that runs tasks synchronously
    pub fn blocking() -> Self {
        Self::with_behavior(MockSpawnBehavior::BlockSync)
    }

    /// Create a mock spawner that holds tasks until released
    pub fn deferred() -> Self {
        Self::with_behavior(MockSpawnBehavior::Deferred)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Lanes of the held tasks, oldest first
    pub fn pending_lanes(&self) -> Vec<&'static str> {
        self.pending.lock().iter().map(|(lane, _)| *lane).collect()
    }

    /// Run the oldest held task; returns false when none is held
    pub fn run_next(&self) -> bool {
        let next = self.pending.lock().pop_front();
        match next {
            Some((_, task)) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Run the newest held task; returns false when none is held
    pub fn run_last(&self) -> bool {
        let last = self.pending.lock().pop_back();
        match last {
            Some((_, task)) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Run held tasks until none remain, including ones they spawn
    pub fn run_all(&self) -> usize {
        let mut ran = 0;
        while self.run_next() {
            ran += 1;
        }
        ran
    }
}

impl WorkerSpawner for MockSpawner {
    fn spawn(&self, lane: &'static str, task: Task) {
        match self.behavior {
            MockSpawnBehavior::Drop => drop(task),
            MockSpawnBehavior::BlockSync => task(),
            MockSpawnBehavior::Deferred => self.pending.lock().push_back((lane, task)),
        }
    }

    fn runtime_name(&self) -> &'static str {
        "Mock"
    }
}
