//! Shared task handle
//!
//! A `Task` has no locking of its own. When several workers can touch the
//! same task (a runner finishing it while a watchdog times it out), every
//! transition goes through one `SharedTask` so they are applied one at a
//! time and exactly one terminal transition wins.

use crate::error::TaskError;
use crate::executor::ExecutionOutcome;
use crate::report::TaskReport;
use crate::state::TaskState;
use crate::task::{OutputStream, Task, TaskKey, TaskTimeout};
use parking_lot::Mutex;
use std::sync::Arc;

/// Cloneable handle serializing all access to one task
#[derive(Debug, Clone)]
pub struct SharedTask {
    key: TaskKey,
    inner: Arc<Mutex<Task>>,
}

impl SharedTask {
    pub fn new(task: Task) -> Self {
        Self {
            key: task.key().clone(),
            inner: Arc::new(Mutex::new(task)),
        }
    }

    pub fn key(&self) -> &TaskKey {
        &self.key
    }

    /// Run a read-only closure against the task
    pub fn with<R>(&self, f: impl FnOnce(&Task) -> R) -> R {
        f(&self.inner.lock())
    }

    /// Clone of the current task
    pub fn snapshot(&self) -> Task {
        self.inner.lock().clone()
    }

    pub fn state(&self) -> TaskState {
        self.inner.lock().state()
    }

    pub fn start(&self) -> Result<(), TaskError> {
        self.inner.lock().start()
    }

    pub fn finish(&self, exit_code: i8) -> Result<(), TaskError> {
        self.inner.lock().finish(exit_code)
    }

    pub fn terminate(&self) -> Result<(), TaskError> {
        self.inner.lock().terminate()
    }

    pub fn time_out(&self) -> Result<(), TaskError> {
        self.inner.lock().time_out()
    }

    pub fn set_timeout(&self, timeout: TaskTimeout) -> Result<(), TaskError> {
        self.inner.lock().set_timeout(timeout)
    }

    pub fn set_output(&self, stream: OutputStream, text: Option<&str>) {
        self.inner.lock().set_output(stream, text);
    }

    pub fn apply_outcome(&self, outcome: ExecutionOutcome) -> Result<(), TaskError> {
        self.inner.lock().apply_outcome(outcome)
    }

    pub fn report(&self) -> Result<TaskReport, TaskError> {
        self.inner.lock().report()
    }

    /// Take the task back out if this is the last handle
    pub fn try_into_inner(self) -> Result<Task, Self> {
        let key = self.key;
        Arc::try_unwrap(self.inner)
            .map(Mutex::into_inner)
            .map_err(|inner| Self { key, inner })
    }
}

impl From<Task> for SharedTask {
    fn from(task: Task) -> Self {
        Self::new(task)
    }
}
