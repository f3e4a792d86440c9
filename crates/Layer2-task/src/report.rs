//! Task result reports

use crate::task::{Task, TaskKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of a finished task, suitable for shipping back to whoever
/// submitted it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskReport {
    pub key: TaskKey,
    pub command: Vec<String>,
    /// Terminal state name (`Finished`, `Terminated`, `TimedOut`)
    pub state: String,
    pub successful: bool,
    pub terminated: bool,
    pub timed_out: bool,
    pub exit_code: i8,
    pub stdout: String,
    pub stderr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl TaskReport {
    /// Build from a task already known to be finished
    pub(crate) fn from_finished(task: &Task) -> Self {
        let state = task.state();
        Self {
            key: task.key().clone(),
            command: task.command().to_vec(),
            state: state.display_name().to_string(),
            successful: task.was_successful(),
            terminated: task.was_terminated(),
            timed_out: task.has_timed_out(),
            exit_code: state.exit_code().unwrap_or(crate::state::NO_EXIT_CODE),
            stdout: task.stdout().unwrap_or_default().to_string(),
            stderr: task.stderr().unwrap_or_default().to_string(),
            started_at: task.started_at(),
            finished_at: task.finished_at(),
            duration_ms: task
                .duration()
                .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
        }
    }

    /// One-line summary for logs and terminals
    pub fn summary(&self) -> String {
        let outcome = if self.timed_out {
            "timed out".to_string()
        } else if self.terminated {
            "terminated".to_string()
        } else {
            format!("exit {}", self.exit_code)
        };
        match self.duration_ms {
            Some(ms) => format!("[{}] {} ({}ms)", self.key, outcome, ms),
            None => format!("[{}] {}", self.key, outcome),
        }
    }
}
