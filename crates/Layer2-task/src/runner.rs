//! Task runner - drives a task through its lifecycle with an executor
//!
//! Features:
//! - Starts the task and hands a snapshot to the executor
//! - Enforces the task timeout (the task itself never starts timers)
//! - Maps executor outcomes and failures to terminal transitions
//! - Termination on request through the same executor

use crate::command::join;
use crate::error::TaskError;
use crate::executor::{ExecutionOutcome, Executor};
use crate::report::TaskReport;
use crate::shared::SharedTask;
use crate::task::Task;
use grid_foundation::{Error, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How the executor call ended, before it is applied to the task
enum Settled {
    Outcome(ExecutionOutcome),
    Failed(Error),
    TimedOut,
}

/// Drives tasks through an executor
#[derive(Clone)]
pub struct TaskRunner {
    executor: Arc<dyn Executor>,
}

impl TaskRunner {
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self { executor }
    }

    pub fn executor_name(&self) -> &'static str {
        self.executor.name()
    }

    /// Run a task to a terminal state and return its report.
    ///
    /// - executor outcome: applied as-is
    /// - timeout elapsed: the executor is asked to cancel and the task is
    ///   marked timed out
    /// - executor error: the task is marked terminated with the error on
    ///   stderr
    ///
    /// If another handle already finished the task while it was executing,
    /// that outcome stands.
    pub async fn run(&self, task: &SharedTask) -> Result<TaskReport> {
        if !self.executor.is_available() {
            return Err(Error::ExecutorUnavailable(self.executor.name().to_string()));
        }

        task.start()?;
        let snapshot = task.snapshot();
        let key = snapshot.key().clone();

        info!(
            "Running task {} on {} executor: {}",
            key,
            self.executor.name(),
            join(snapshot.command())
        );

        let settled = self.execute(&snapshot).await;

        let applied = match settled {
            Settled::Outcome(outcome) => {
                debug!("Task {} reported {:?}", key, outcome);
                task.apply_outcome(outcome)
            }
            Settled::Failed(err) => {
                warn!("Executor failed for task {}: {}", key, err);
                task.apply_outcome(ExecutionOutcome::terminated(err.to_string()))
            }
            Settled::TimedOut => {
                warn!("Task {} exceeded timeout {}", key, snapshot.timeout());
                if let Err(err) = self.executor.cancel(&snapshot).await {
                    warn!("Failed to cancel timed out task {}: {}", key, err);
                }
                task.apply_outcome(ExecutionOutcome::timed_out(format!(
                    "Task timed out after {}",
                    snapshot.timeout()
                )))
            }
        };

        if let Err(err) = applied {
            settle_conflict(task, err)?;
        }

        let report = task.report()?;
        info!("{}", report.summary());
        Ok(report)
    }

    async fn execute(&self, snapshot: &Task) -> Settled {
        let execution = self.executor.execute(snapshot);
        let result = match snapshot.timeout().as_duration() {
            Some(limit) => match tokio::time::timeout(limit, execution).await {
                Ok(result) => result,
                Err(_) => return Settled::TimedOut,
            },
            None => execution.await,
        };
        match result {
            Ok(outcome) => Settled::Outcome(outcome),
            Err(err) => Settled::Failed(err),
        }
    }

    /// Terminate a running task and ask the executor to kill its command.
    ///
    /// The task is marked first, so a task that is not running is rejected
    /// without touching the executor.
    pub async fn terminate(&self, task: &SharedTask) -> Result<()> {
        task.terminate()?;
        let snapshot = task.snapshot();
        info!("Terminating task {}", snapshot.key());
        self.executor.cancel(&snapshot).await
    }
}

/// A rejected terminal transition is fine if someone else got there first
fn settle_conflict(task: &SharedTask, err: TaskError) -> Result<()> {
    if task.state().is_finished() {
        debug!(
            "Task {} already {} before its outcome was applied",
            task.key(),
            task.state()
        );
        Ok(())
    } else {
        Err(err.into())
    }
}
