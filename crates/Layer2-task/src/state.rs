//! Task state machine

use serde::{Deserialize, Serialize};

/// Exit code reported for a task that never exited on its own.
pub const NO_EXIT_CODE: i8 = -1;

/// Lifecycle of a task.
///
/// `Unstarted -> Running -> {Finished, Terminated, TimedOut}`. The three
/// terminal states are final. A timed out task also counts as terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TaskState {
    /// Created but not yet handed to an executor
    #[default]
    Unstarted,

    /// Started and not yet finished
    Running,

    /// Exited on its own with an exit code (0 means success)
    Finished { exit_code: i8 },

    /// Killed before it could exit
    Terminated,

    /// Killed because it exceeded its timeout
    TimedOut,
}

impl TaskState {
    /// True once `start()` has been applied
    pub fn was_started(&self) -> bool {
        !matches!(self, TaskState::Unstarted)
    }

    /// Check if task is currently running
    pub fn is_running(&self) -> bool {
        matches!(self, TaskState::Running)
    }

    /// Check if this is a terminal state (cannot transition further)
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            TaskState::Finished { .. } | TaskState::Terminated | TaskState::TimedOut
        )
    }

    /// Terminated explicitly or by timeout
    pub fn was_terminated(&self) -> bool {
        matches!(self, TaskState::Terminated | TaskState::TimedOut)
    }

    pub fn has_timed_out(&self) -> bool {
        matches!(self, TaskState::TimedOut)
    }

    /// Exit code once terminal; killed tasks report [`NO_EXIT_CODE`].
    pub fn exit_code(&self) -> Option<i8> {
        match self {
            TaskState::Finished { exit_code } => Some(*exit_code),
            TaskState::Terminated | TaskState::TimedOut => Some(NO_EXIT_CODE),
            TaskState::Unstarted | TaskState::Running => None,
        }
    }

    /// Finished on its own with exit code 0
    pub fn is_success(&self) -> bool {
        matches!(self, TaskState::Finished { exit_code: 0 })
    }

    /// Get display name for the state
    pub fn display_name(&self) -> &'static str {
        match self {
            TaskState::Unstarted => "Unstarted",
            TaskState::Running => "Running",
            TaskState::Finished { .. } => "Finished",
            TaskState::Terminated => "Terminated",
            TaskState::TimedOut => "TimedOut",
        }
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskState::Finished { exit_code } => write!(f, "Finished({})", exit_code),
            other => write!(f, "{}", other.display_name()),
        }
    }
}
