//! Lifecycle 통합 테스트 - executor가 태스크를 끝까지 구동하는 시나리오
//!
//! `cargo test -p grid-task --test lifecycle_test -- --nocapture`

use async_trait::async_trait;
use grid_foundation::{Error, GridConfig, Result};
use grid_task::{
    ExecutionOutcome, Executor, SharedTask, Task, TaskError, TaskRunner, TaskState, TaskTimeout,
    Transition,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Replies from a table keyed by the program name, like a node that only
/// knows a few binaries.
struct TableExecutor {
    replies: HashMap<&'static str, (i8, &'static str)>,
}

#[async_trait]
impl Executor for TableExecutor {
    async fn execute(&self, task: &Task) -> Result<ExecutionOutcome> {
        let program = task
            .command()
            .first()
            .ok_or_else(|| Error::executor("table", "empty command"))?;

        if program == "sleep" {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }

        match self.replies.get(program.as_str()) {
            Some((code, stdout)) => Ok(ExecutionOutcome::Exited {
                exit_code: *code,
                stdout: Some(stdout.to_string()),
                stderr: Some(format!("ran {}", program)),
            }),
            None => Err(Error::executor("table", format!("{}: command not found", program))),
        }
    }

    async fn cancel(&self, _task: &Task) -> Result<()> {
        Ok(())
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "table"
    }
}

fn runner() -> TaskRunner {
    let replies = HashMap::from([("echo", (0, "hello world\n")), ("false", (1, ""))]);
    TaskRunner::new(Arc::new(TableExecutor { replies }))
}

#[tokio::test]
async fn test_batch_of_tasks() {
    let runner = runner();
    let tasks: Vec<SharedTask> = [
        ("ok", "echo \"hello world\"", TaskTimeout::from_secs(5)),
        ("fail", "false", TaskTimeout::from_secs(5)),
        ("missing", "frobnicate --all", TaskTimeout::from_secs(5)),
        ("slow", "sleep 100", TaskTimeout::from_millis(25)),
    ]
    .into_iter()
    .map(|(key, line, timeout)| SharedTask::new(Task::new(key, line, timeout)))
    .collect();

    let mut reports = HashMap::new();
    for task in &tasks {
        let report = runner.run(task).await.expect("run failed");
        println!("{}", report.summary());
        reports.insert(report.key.to_string(), report);
    }

    let ok = &reports["ok"];
    assert!(ok.successful);
    assert_eq!(ok.command, vec!["echo", "hello world"]);
    assert_eq!(ok.stdout, "hello world\n");

    let fail = &reports["fail"];
    assert!(!fail.successful && !fail.terminated);
    assert_eq!(fail.exit_code, 1);

    let missing = &reports["missing"];
    assert!(missing.terminated && !missing.timed_out);
    assert!(missing.stderr.contains("command not found"));

    let slow = &reports["slow"];
    assert!(slow.timed_out && slow.terminated);
    assert_eq!(slow.exit_code, -1);
}

#[tokio::test]
async fn test_config_driven_capture() {
    let config = GridConfig::new().capture_stdout(false).timeout_ms(5_000);
    let task = Task::from_defaults("quiet", "echo hi", &config.task);
    let task = SharedTask::new(task);

    let report = runner().run(&task).await.unwrap();

    assert!(report.successful);
    assert_eq!(report.stdout, "");
    assert_eq!(report.stderr, "ran echo");
}

#[test]
fn test_manual_driving_by_external_executor() {
    // An executor that does not use TaskRunner drives the task directly.
    let mut task = Task::new("manual", "run --flag \"hello world\" end", TaskTimeout::Unbounded);
    task.set_timeout(TaskTimeout::from_secs(1)).unwrap();

    task.start().unwrap();
    assert_eq!(
        task.set_timeout(TaskTimeout::Unbounded),
        Err(TaskError::InvalidTransition {
            transition: Transition::SetTimeout,
            from: TaskState::Running,
        })
    );

    task.set_stdout(Some("partial"));
    task.time_out().unwrap();

    assert_eq!(task.state(), TaskState::TimedOut);
    assert_eq!(task.exit_code(), Ok(-1));
    assert_eq!(task.stdout(), Ok("partial"));
    assert!(task.finish(0).is_err());
    assert_eq!(task.exit_code(), Ok(-1));
}

#[test]
fn test_task_json_round_trip() {
    let mut task = Task::new("persist", "ls -la", TaskTimeout::from_millis(100));
    task.start().unwrap();
    task.finish(0).unwrap();

    let json = serde_json::to_string(&task).unwrap();
    let back: Task = serde_json::from_str(&json).unwrap();
    assert_eq!(back, task);
}

#[test]
fn test_tampered_task_json_is_rejected() {
    let mut task = Task::with_capture("quiet", "make", false, false, TaskTimeout::Unbounded);
    task.start().unwrap();
    task.terminate().unwrap();

    let mut json = serde_json::to_value(&task).unwrap();
    json["stderr"] = "should have been discarded".into();

    let err = serde_json::from_value::<Task>(json).unwrap_err();
    assert!(err.to_string().contains("invalid task record quiet"));
}
