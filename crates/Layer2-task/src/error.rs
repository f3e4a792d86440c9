//! Task precondition errors

use crate::state::TaskState;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// State-changing operations on a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transition {
    Start,
    Finish,
    Terminate,
    TimeOut,
    SetTimeout,
}

impl Transition {
    /// The state this operation must be applied from
    pub fn required_state(&self) -> &'static str {
        match self {
            Transition::Start | Transition::SetTimeout => "Unstarted",
            Transition::Finish | Transition::Terminate | Transition::TimeOut => "Running",
        }
    }
}

impl std::fmt::Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Transition::Start => "start",
            Transition::Finish => "finish",
            Transition::Terminate => "terminate",
            Transition::TimeOut => "time out",
            Transition::SetTimeout => "set timeout",
        };
        f.write_str(name)
    }
}

/// Outcome fields that are only readable after a terminal state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutcomeField {
    ExitCode,
    Stdout,
    Stderr,
    Report,
}

impl std::fmt::Display for OutcomeField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OutcomeField::ExitCode => "exit code",
            OutcomeField::Stdout => "standard output",
            OutcomeField::Stderr => "standard error",
            OutcomeField::Report => "report",
        };
        f.write_str(name)
    }
}

/// A task operation called from a state that does not permit it.
///
/// The task is never modified when one of these is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("cannot {transition} task in state {from}: task must be {}", .transition.required_state())]
    InvalidTransition { transition: Transition, from: TaskState },

    #[error("cannot read {field} of task in state {state}: task is not finished")]
    NotFinished { field: OutcomeField, state: TaskState },
}

impl TaskError {
    /// State the task was in when the call was rejected
    pub fn state(&self) -> TaskState {
        match self {
            TaskError::InvalidTransition { from, .. } => *from,
            TaskError::NotFinished { state, .. } => *state,
        }
    }
}

/// A serialized task whose fields contradict each other
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid task record {key}: {reason}")]
pub struct InvalidTaskRecord {
    pub key: String,
    pub reason: &'static str,
}

impl From<TaskError> for grid_foundation::Error {
    fn from(err: TaskError) -> Self {
        grid_foundation::Error::InvalidState(err.to_string())
    }
}
