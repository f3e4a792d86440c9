//! Executor trait

use crate::executor::ExecutionOutcome;
use crate::task::Task;
use async_trait::async_trait;
use grid_foundation::Result;

/// Executor trait - implement to add new execution backends
///
/// `execute` receives a snapshot of a task that has already been started.
/// It runs [`Task::command`] and reports how it ended; it never changes the
/// task's state itself.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Execute a task's command
    async fn execute(&self, task: &Task) -> Result<ExecutionOutcome>;

    /// Kill a running task's command
    async fn cancel(&self, task: &Task) -> Result<()>;

    /// Check if the executor is available
    fn is_available(&self) -> bool;

    /// Get executor name
    fn name(&self) -> &'static str;
}
