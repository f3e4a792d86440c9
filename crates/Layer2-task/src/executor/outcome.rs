//! Execution outcomes reported by executors

use serde::{Deserialize, Serialize};

/// How a task's command ended on the node.
///
/// Output is `None` when the executor did not collect it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ExecutionOutcome {
    /// The command exited on its own
    Exited {
        exit_code: i8,
        stdout: Option<String>,
        stderr: Option<String>,
    },

    /// The command was killed on request
    Terminated {
        stdout: Option<String>,
        stderr: Option<String>,
    },

    /// The command was killed after exceeding its timeout
    TimedOut {
        stdout: Option<String>,
        stderr: Option<String>,
    },
}

impl ExecutionOutcome {
    pub fn exited(exit_code: i8, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::Exited {
            exit_code,
            stdout: Some(stdout.into()),
            stderr: Some(stderr.into()),
        }
    }

    /// Killed on request, with an explanation on stderr
    pub fn terminated(reason: impl Into<String>) -> Self {
        Self::Terminated {
            stdout: None,
            stderr: Some(reason.into()),
        }
    }

    /// Killed by the timeout, with an explanation on stderr
    pub fn timed_out(reason: impl Into<String>) -> Self {
        Self::TimedOut {
            stdout: None,
            stderr: Some(reason.into()),
        }
    }
}
