//! Task sink trait and implementations.

use std::sync::{Arc, Mutex};

use super::Task;
use crate::errors::Result;

/// Fire-and-forget task submission.
///
/// `submit()` must not wait for the task to run. An error means the task could
/// not be enqueued at all (queue closed), never that it failed.
pub trait TaskSink: Send + Sync {
    fn submit(&self, task: Task) -> Result<()>;
}

/// Mock sink for testing - collects submitted tasks.
#[derive(Clone, Default)]
pub struct MockTaskSink {
    tasks: Arc<Mutex<Vec<Task>>>,
}

impl MockTaskSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected tasks.
    pub fn tasks(&self) -> Vec<Task> {
        self.tasks.lock().unwrap().clone()
    }

    /// Returns and clears collected tasks.
    pub fn drain(&self) -> Vec<Task> {
        std::mem::take(&mut *self.tasks.lock().unwrap())
    }

    pub fn len(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.lock().unwrap().is_empty()
    }
}

impl TaskSink for MockTaskSink {
    fn submit(&self, task: Task) -> Result<()> {
        self.tasks.lock().unwrap().push(task);
        Ok(())
    }
}
