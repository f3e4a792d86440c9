//! Task definition and types

use crate::command::tokenize;
use crate::error::{InvalidTaskRecord, OutcomeField, TaskError, Transition};
use crate::executor::ExecutionOutcome;
use crate::report::TaskReport;
use crate::state::TaskState;
use chrono::{DateTime, Utc};
use grid_foundation::TaskDefaults;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// Key used to correlate a task with its result after execution
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskKey(String);

impl TaskKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Generate a random key for tasks without a natural one
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TaskKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for TaskKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl std::fmt::Display for TaskKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// How long the executor lets the command run before killing it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskTimeout {
    /// Limit in milliseconds
    Millis(u64),

    /// No practical limit
    #[default]
    Unbounded,
}

impl TaskTimeout {
    /// `u64::MAX` is treated as unbounded
    pub fn from_millis(ms: u64) -> Self {
        if ms == u64::MAX {
            Self::Unbounded
        } else {
            Self::Millis(ms)
        }
    }

    pub fn from_secs(secs: u64) -> Self {
        Self::from_millis(secs.saturating_mul(1000))
    }

    pub fn as_millis(&self) -> Option<u64> {
        match self {
            Self::Millis(ms) => Some(*ms),
            Self::Unbounded => None,
        }
    }

    pub fn as_duration(&self) -> Option<Duration> {
        self.as_millis().map(Duration::from_millis)
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, Self::Unbounded)
    }
}

impl From<Duration> for TaskTimeout {
    fn from(duration: Duration) -> Self {
        Self::from_millis(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }
}

impl From<Option<u64>> for TaskTimeout {
    fn from(ms: Option<u64>) -> Self {
        ms.map(Self::from_millis).unwrap_or(Self::Unbounded)
    }
}

impl std::fmt::Display for TaskTimeout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Millis(ms) => write!(f, "{}ms", ms),
            Self::Unbounded => f.write_str("unbounded"),
        }
    }
}

/// Captured output stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// A command to be run on a cluster node.
///
/// The task does not run anything itself. An executor starts it, runs
/// [`Task::command`], and reports exactly one outcome through
/// [`Task::finish`], [`Task::terminate`] or [`Task::time_out`]. Outcome
/// accessors fail until one of those has been applied.
///
/// Deserialization rejects payloads that no sequence of transitions could
/// have produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TaskRecord")]
pub struct Task {
    key: TaskKey,

    /// Tokenized argument vector
    command: Vec<String>,

    capture_stdout: bool,
    capture_stderr: bool,

    /// Frozen once started
    timeout: TaskTimeout,

    state: TaskState,

    stdout: String,
    stderr: String,

    /// When the task was started
    started_at: Option<DateTime<Utc>>,

    /// When the task reached a terminal state
    finished_at: Option<DateTime<Utc>>,
}

/// Wire form of [`Task`], checked before it becomes one
#[derive(Deserialize)]
struct TaskRecord {
    key: TaskKey,
    command: Vec<String>,
    capture_stdout: bool,
    capture_stderr: bool,
    timeout: TaskTimeout,
    state: TaskState,
    stdout: String,
    stderr: String,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

impl TaskRecord {
    fn inconsistency(&self) -> Option<&'static str> {
        if !self.capture_stdout && !self.stdout.is_empty() {
            return Some("stdout recorded without capture");
        }
        if !self.capture_stderr && !self.stderr.is_empty() {
            return Some("stderr recorded without capture");
        }
        match (self.state, self.started_at, self.finished_at) {
            (TaskState::Unstarted, None, None) => None,
            (TaskState::Unstarted, _, _) => Some("unstarted task has timestamps"),
            (TaskState::Running, Some(_), None) => None,
            (TaskState::Running, _, _) => Some("running task needs a start and no finish time"),
            (_, Some(start), Some(end)) if end < start => Some("finished before it started"),
            (_, Some(_), Some(_)) => None,
            _ => Some("finished task needs start and finish times"),
        }
    }
}

impl TryFrom<TaskRecord> for Task {
    type Error = InvalidTaskRecord;

    fn try_from(record: TaskRecord) -> Result<Self, Self::Error> {
        if let Some(reason) = record.inconsistency() {
            return Err(InvalidTaskRecord {
                key: record.key.0,
                reason,
            });
        }
        Ok(Self {
            key: record.key,
            command: record.command,
            capture_stdout: record.capture_stdout,
            capture_stderr: record.capture_stderr,
            timeout: record.timeout,
            state: record.state,
            stdout: record.stdout,
            stderr: record.stderr,
            started_at: record.started_at,
            finished_at: record.finished_at,
        })
    }
}

impl Task {
    /// Create a task that captures both output streams
    pub fn new(key: impl Into<TaskKey>, command_line: &str, timeout: TaskTimeout) -> Self {
        Self::with_capture(key, command_line, true, true, timeout)
    }

    /// Create a task with explicit capture flags
    pub fn with_capture(
        key: impl Into<TaskKey>,
        command_line: &str,
        capture_stdout: bool,
        capture_stderr: bool,
        timeout: TaskTimeout,
    ) -> Self {
        Self {
            key: key.into(),
            command: tokenize(command_line),
            capture_stdout,
            capture_stderr,
            timeout,
            state: TaskState::Unstarted,
            stdout: String::new(),
            stderr: String::new(),
            started_at: None,
            finished_at: None,
        }
    }

    /// Create a task from configured defaults
    pub fn from_defaults(
        key: impl Into<TaskKey>,
        command_line: &str,
        defaults: &TaskDefaults,
    ) -> Self {
        Self::with_capture(
            key,
            command_line,
            defaults.captures_stdout(),
            defaults.captures_stderr(),
            TaskTimeout::from(defaults.timeout_ms),
        )
    }

    // ========================================================================
    // Construction-time properties
    // ========================================================================

    pub fn key(&self) -> &TaskKey {
        &self.key
    }

    pub fn command(&self) -> &[String] {
        &self.command
    }

    pub fn captures_stdout(&self) -> bool {
        self.capture_stdout
    }

    pub fn captures_stderr(&self) -> bool {
        self.capture_stderr
    }

    pub fn timeout(&self) -> TaskTimeout {
        self.timeout
    }

    /// Change the timeout. Only allowed before the task is started.
    pub fn set_timeout(&mut self, timeout: TaskTimeout) -> Result<(), TaskError> {
        self.guard(Transition::SetTimeout, !self.state.was_started())?;
        self.timeout = timeout;
        Ok(())
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    fn guard(&self, transition: Transition, allowed: bool) -> Result<(), TaskError> {
        if allowed {
            Ok(())
        } else {
            debug!("Rejected {} on task {} in state {}", transition, self.key, self.state);
            Err(TaskError::InvalidTransition {
                transition,
                from: self.state,
            })
        }
    }

    fn enter_terminal(&mut self, state: TaskState) {
        self.state = state;
        self.finished_at = Some(Utc::now());
        debug!("Task {} -> {}", self.key, state);
    }

    /// Mark task as started
    pub fn start(&mut self) -> Result<(), TaskError> {
        self.guard(Transition::Start, self.state == TaskState::Unstarted)?;
        self.state = TaskState::Running;
        self.started_at = Some(Utc::now());
        debug!("Task {} -> {}", self.key, self.state);
        Ok(())
    }

    /// Mark task as finished on its own with the given exit code.
    ///
    /// This is the only place an exit code is recorded.
    pub fn finish(&mut self, exit_code: i8) -> Result<(), TaskError> {
        self.guard(Transition::Finish, self.state.is_running())?;
        self.enter_terminal(TaskState::Finished { exit_code });
        Ok(())
    }

    /// Mark task as terminated. The exit code stays unset.
    pub fn terminate(&mut self) -> Result<(), TaskError> {
        self.guard(Transition::Terminate, self.state.is_running())?;
        self.enter_terminal(TaskState::Terminated);
        Ok(())
    }

    /// Mark task as terminated because it ran past its timeout
    pub fn time_out(&mut self) -> Result<(), TaskError> {
        self.guard(Transition::TimeOut, self.state.is_running())?;
        self.enter_terminal(TaskState::TimedOut);
        Ok(())
    }

    /// Apply an outcome reported by an executor.
    ///
    /// Performs the matching terminal transition and records the output.
    /// Nothing is recorded if the transition is rejected.
    pub fn apply_outcome(&mut self, outcome: ExecutionOutcome) -> Result<(), TaskError> {
        let (stdout, stderr) = match outcome {
            ExecutionOutcome::Exited {
                exit_code,
                stdout,
                stderr,
            } => {
                self.finish(exit_code)?;
                (stdout, stderr)
            }
            ExecutionOutcome::Terminated { stdout, stderr } => {
                self.terminate()?;
                (stdout, stderr)
            }
            ExecutionOutcome::TimedOut { stdout, stderr } => {
                self.time_out()?;
                (stdout, stderr)
            }
        };
        self.set_stdout(stdout.as_deref());
        self.set_stderr(stderr.as_deref());
        Ok(())
    }

    // ========================================================================
    // Output
    // ========================================================================

    /// Record captured text for a stream.
    ///
    /// Stores the empty string if the stream is not captured or no text is
    /// given.
    pub fn set_output(&mut self, stream: OutputStream, text: Option<&str>) {
        let (captured, slot) = match stream {
            OutputStream::Stdout => (self.capture_stdout, &mut self.stdout),
            OutputStream::Stderr => (self.capture_stderr, &mut self.stderr),
        };
        slot.clear();
        if captured {
            if let Some(text) = text {
                slot.push_str(text);
            }
        }
    }

    pub fn set_stdout(&mut self, text: Option<&str>) {
        self.set_output(OutputStream::Stdout, text);
    }

    pub fn set_stderr(&mut self, text: Option<&str>) {
        self.set_output(OutputStream::Stderr, text);
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn was_started(&self) -> bool {
        self.state.was_started()
    }

    /// Started and not yet finished
    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub fn has_finished(&self) -> bool {
        self.state.is_finished()
    }

    /// Terminated explicitly or by timeout
    pub fn was_terminated(&self) -> bool {
        self.state.was_terminated()
    }

    pub fn has_timed_out(&self) -> bool {
        self.state.has_timed_out()
    }

    /// Finished on its own with exit code 0.
    ///
    /// False for unfinished, terminated and timed out tasks.
    pub fn was_successful(&self) -> bool {
        self.state.is_success()
    }

    fn require_finished(&self, field: OutcomeField) -> Result<(), TaskError> {
        if self.state.is_finished() {
            Ok(())
        } else {
            Err(TaskError::NotFinished {
                field,
                state: self.state,
            })
        }
    }

    /// Exit code of the command; `-1` if the task was terminated or timed out
    pub fn exit_code(&self) -> Result<i8, TaskError> {
        match self.state.exit_code() {
            Some(code) => Ok(code),
            None => Err(TaskError::NotFinished {
                field: OutcomeField::ExitCode,
                state: self.state,
            }),
        }
    }

    pub fn stdout(&self) -> Result<&str, TaskError> {
        self.require_finished(OutcomeField::Stdout)?;
        Ok(&self.stdout)
    }

    pub fn stderr(&self) -> Result<&str, TaskError> {
        self.require_finished(OutcomeField::Stderr)?;
        Ok(&self.stderr)
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Get execution duration if task has started
    pub fn duration(&self) -> Option<Duration> {
        let start = self.started_at?;
        let end = self.finished_at.unwrap_or_else(Utc::now);
        Some((end - start).to_std().unwrap_or_default())
    }

    /// Snapshot of the outcome, available once finished
    pub fn report(&self) -> Result<TaskReport, TaskError> {
        self.require_finished(OutcomeField::Report)?;
        Ok(TaskReport::from_finished(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::NO_EXIT_CODE;

    fn task() -> Task {
        Task::new("t1", "run --flag \"hello world\" end", TaskTimeout::from_millis(5_000))
    }

    fn running() -> Task {
        let mut task = task();
        task.start().unwrap();
        task
    }

    #[test]
    fn test_construction() {
        let task = task();
        assert_eq!(task.key().as_str(), "t1");
        assert_eq!(task.command(), ["run", "--flag", "hello world", "end"]);
        assert!(task.captures_stdout());
        assert!(task.captures_stderr());
        assert_eq!(task.timeout(), TaskTimeout::Millis(5_000));
        assert_eq!(task.state(), TaskState::Unstarted);
        assert!(task.started_at().is_none());
        assert!(task.duration().is_none());
    }

    #[test]
    fn test_fresh_task_outcome_unreadable() {
        let task = task();
        assert!(!task.is_running());
        assert!(!task.was_started());
        assert!(!task.was_successful());
        assert_eq!(
            task.exit_code(),
            Err(TaskError::NotFinished {
                field: OutcomeField::ExitCode,
                state: TaskState::Unstarted
            })
        );
        assert!(matches!(task.stdout(), Err(TaskError::NotFinished { .. })));
        assert!(matches!(task.stderr(), Err(TaskError::NotFinished { .. })));
        assert!(matches!(task.report(), Err(TaskError::NotFinished { .. })));
    }

    #[test]
    fn test_start() {
        let mut task = running();
        assert!(task.is_running());
        assert!(task.was_started());
        assert!(task.started_at().is_some());

        let before = task.clone();
        let err = task.start().unwrap_err();
        assert_eq!(
            err,
            TaskError::InvalidTransition {
                transition: Transition::Start,
                from: TaskState::Running
            }
        );
        assert_eq!(task, before);
    }

    #[test]
    fn test_running_outcome_unreadable() {
        let task = running();
        assert!(task.exit_code().is_err());
        assert!(task.stdout().is_err());
    }

    #[test]
    fn test_finish_success() {
        let mut task = running();
        task.finish(0).unwrap();

        assert!(task.was_successful());
        assert!(task.has_finished());
        assert!(!task.is_running());
        assert!(!task.has_timed_out());
        assert!(!task.was_terminated());
        assert_eq!(task.exit_code(), Ok(0));
        assert!(task.finished_at().is_some());
        assert!(task.duration().is_some());
    }

    #[test]
    fn test_finish_failure() {
        let mut task = running();
        task.finish(17).unwrap();

        assert!(!task.was_successful());
        assert_eq!(task.exit_code(), Ok(17));
    }

    #[test]
    fn test_time_out() {
        let mut task = running();
        task.time_out().unwrap();

        assert!(task.has_timed_out());
        assert!(task.was_terminated());
        assert!(task.has_finished());
        assert_eq!(task.exit_code(), Ok(NO_EXIT_CODE));
        assert!(!task.was_successful());
    }

    #[test]
    fn test_terminate() {
        let mut task = running();
        task.terminate().unwrap();

        assert!(task.was_terminated());
        assert!(!task.has_timed_out());
        assert_eq!(task.exit_code(), Ok(NO_EXIT_CODE));
        assert!(!task.was_successful());
    }

    #[test]
    fn test_transitions_require_running() {
        let mut task = task();
        let before = task.clone();

        assert!(matches!(
            task.finish(0),
            Err(TaskError::InvalidTransition { transition: Transition::Finish, .. })
        ));
        assert!(matches!(
            task.terminate(),
            Err(TaskError::InvalidTransition { transition: Transition::Terminate, .. })
        ));
        assert!(matches!(
            task.time_out(),
            Err(TaskError::InvalidTransition { transition: Transition::TimeOut, .. })
        ));
        assert_eq!(task, before);
    }

    #[test]
    fn test_terminal_states_are_sticky() {
        let terminal: [fn(&mut Task) -> Result<(), TaskError>; 3] = [
            |t| t.finish(3),
            |t| t.terminate(),
            |t| t.time_out(),
        ];

        for apply in terminal {
            let mut task = running();
            apply(&mut task).unwrap();
            let before = task.clone();

            assert!(task.start().is_err());
            assert!(task.finish(0).is_err());
            assert!(task.terminate().is_err());
            assert!(task.time_out().is_err());
            assert!(task.set_timeout(TaskTimeout::Unbounded).is_err());
            assert_eq!(task, before);
        }
    }

    #[test]
    fn test_set_timeout() {
        let mut task = task();
        task.set_timeout(TaskTimeout::from_secs(2)).unwrap();
        assert_eq!(task.timeout(), TaskTimeout::Millis(2_000));

        task.start().unwrap();
        let err = task.set_timeout(TaskTimeout::Unbounded).unwrap_err();
        assert_eq!(
            err,
            TaskError::InvalidTransition {
                transition: Transition::SetTimeout,
                from: TaskState::Running
            }
        );
        assert_eq!(task.timeout(), TaskTimeout::Millis(2_000));
    }

    #[test]
    fn test_uncaptured_stdout_is_empty() {
        let mut task = Task::with_capture("t2", "ls", false, true, TaskTimeout::Unbounded);
        task.start().unwrap();
        task.set_output(OutputStream::Stdout, Some("anything"));
        task.set_output(OutputStream::Stderr, Some("warning"));
        task.finish(0).unwrap();

        assert_eq!(task.stdout(), Ok(""));
        assert_eq!(task.stderr(), Ok("warning"));
    }

    #[test]
    fn test_missing_text_clears_stream() {
        let mut task = running();
        task.set_stdout(Some("partial"));
        task.set_stdout(None);
        task.finish(0).unwrap();
        assert_eq!(task.stdout(), Ok(""));
    }

    #[test]
    fn test_apply_outcome() {
        let mut task = running();
        task.apply_outcome(ExecutionOutcome::exited(2, "out", "err"))
            .unwrap();

        assert_eq!(task.exit_code(), Ok(2));
        assert_eq!(task.stdout(), Ok("out"));
        assert_eq!(task.stderr(), Ok("err"));
    }

    #[test]
    fn test_apply_outcome_rejected_records_nothing() {
        let mut task = task();
        let before = task.clone();

        let result = task.apply_outcome(ExecutionOutcome::exited(0, "out", "err"));
        assert!(result.is_err());
        assert_eq!(task, before);
    }

    #[test]
    fn test_from_defaults() {
        let defaults = TaskDefaults {
            timeout_ms: Some(750),
            capture_stdout: Some(false),
            capture_stderr: None,
        };
        let task = Task::from_defaults("t3", "echo hi", &defaults);

        assert_eq!(task.timeout(), TaskTimeout::Millis(750));
        assert!(!task.captures_stdout());
        assert!(task.captures_stderr());

        let task = Task::from_defaults("t4", "echo hi", &TaskDefaults::default());
        assert!(task.timeout().is_unbounded());
    }

    #[test]
    fn test_timeout_conversions() {
        assert_eq!(TaskTimeout::from_millis(u64::MAX), TaskTimeout::Unbounded);
        assert_eq!(TaskTimeout::from(Duration::from_secs(3)), TaskTimeout::Millis(3_000));
        assert_eq!(TaskTimeout::from(None), TaskTimeout::Unbounded);
        assert_eq!(
            TaskTimeout::Millis(40).as_duration(),
            Some(Duration::from_millis(40))
        );
        assert_eq!(TaskTimeout::Unbounded.to_string(), "unbounded");
    }

    #[test]
    fn test_generated_keys_are_unique() {
        assert_ne!(TaskKey::generate(), TaskKey::generate());
    }

    fn tampered(task: &Task, edit: impl FnOnce(&mut serde_json::Value)) -> serde_json::Value {
        let mut json = serde_json::to_value(task).unwrap();
        edit(&mut json);
        json
    }

    #[test]
    fn test_deserialize_rejects_uncaptured_output() {
        let mut task = Task::with_capture("t5", "ls", false, true, TaskTimeout::Unbounded);
        task.start().unwrap();
        task.finish(0).unwrap();

        let json = tampered(&task, |json| json["stdout"] = "leaked".into());
        let err = serde_json::from_value::<Task>(json).unwrap_err();
        assert!(err.to_string().contains("stdout recorded without capture"));

        let json = tampered(&task, |json| json["stderr"] = "fine".into());
        assert!(serde_json::from_value::<Task>(json).is_ok());
    }

    #[test]
    fn test_deserialize_rejects_impossible_lifecycle() {
        let finished = {
            let mut task = running();
            task.finish(3).unwrap();
            task
        };

        // Back to running after a finish time was stamped
        let json = tampered(&finished, |json| {
            json["state"] = serde_json::json!({ "state": "running" })
        });
        assert!(serde_json::from_value::<Task>(json).is_err());

        // Finished without ever starting
        let json = tampered(&finished, |json| json["started_at"] = serde_json::Value::Null);
        assert!(serde_json::from_value::<Task>(json).is_err());

        // Unstarted with a start time
        let json = tampered(&task(), |json| {
            json["started_at"] = serde_json::to_value(Utc::now()).unwrap()
        });
        assert!(serde_json::from_value::<Task>(json).is_err());

        let back: Task = serde_json::from_value(serde_json::to_value(&finished).unwrap()).unwrap();
        assert_eq!(back.exit_code(), Ok(3));
    }
}
