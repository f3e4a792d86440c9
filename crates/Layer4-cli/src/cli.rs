//! Subcommand implementations

use anyhow::Context;
use async_trait::async_trait;
use grid_foundation::{GridConfig, TaskDefaults};
use grid_task::{
    tokenize, ExecutionOutcome, Executor, SharedTask, Task, TaskKey, TaskReport, TaskRunner,
    TaskTimeout,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Task construction options shared by `plan` and `simulate`
#[derive(clap::Args, Debug, Clone)]
pub struct TaskArgs {
    /// Command line to run, quote arguments that contain spaces
    pub line: String,

    /// Key used to correlate the result (random if omitted)
    #[arg(short, long)]
    pub key: Option<String>,

    /// Timeout in milliseconds (overrides config)
    #[arg(short, long)]
    pub timeout_ms: Option<u64>,

    /// Discard standard output
    #[arg(long)]
    pub no_stdout: bool,

    /// Discard standard error
    #[arg(long)]
    pub no_stderr: bool,
}

/// Task defaults written by `init`
#[derive(clap::Args, Debug, Clone, Default)]
pub struct InitArgs {
    /// Default timeout in milliseconds (unbounded if omitted)
    #[arg(short, long)]
    pub timeout_ms: Option<u64>,

    /// Discard standard output by default
    #[arg(long)]
    pub no_stdout: bool,

    /// Discard standard error by default
    #[arg(long)]
    pub no_stderr: bool,
}

impl InitArgs {
    fn config(&self) -> GridConfig {
        let mut config = GridConfig::new()
            .capture_stdout(!self.no_stdout)
            .capture_stderr(!self.no_stderr);
        if let Some(timeout_ms) = self.timeout_ms {
            config = config.timeout_ms(timeout_ms);
        }
        config
    }
}

/// Outcome the simulated node reports
#[derive(clap::Args, Debug, Clone)]
pub struct OutcomeArgs {
    /// Exit code of the simulated command
    #[arg(
        short,
        long,
        default_value_t = 0,
        allow_hyphen_values = true,
        conflicts_with_all = ["terminate", "time_out"]
    )]
    pub exit_code: i8,

    /// Text the command writes to standard output
    #[arg(long)]
    pub stdout: Option<String>,

    /// Text the command writes to standard error
    #[arg(long)]
    pub stderr: Option<String>,

    /// Report the command as killed instead of exiting
    #[arg(long, conflicts_with = "time_out")]
    pub terminate: bool,

    /// Report the command as killed by its timeout
    #[arg(long)]
    pub time_out: bool,

    /// How long the simulated command runs
    #[arg(long, default_value_t = 0)]
    pub delay_ms: u64,
}

impl OutcomeArgs {
    fn outcome(&self) -> ExecutionOutcome {
        let stdout = self.stdout.clone();
        let stderr = self.stderr.clone();
        if self.time_out {
            ExecutionOutcome::TimedOut { stdout, stderr }
        } else if self.terminate {
            ExecutionOutcome::Terminated { stdout, stderr }
        } else {
            ExecutionOutcome::Exited {
                exit_code: self.exit_code,
                stdout,
                stderr,
            }
        }
    }
}

/// Executor that replays a fixed outcome after a delay
struct ReplayExecutor {
    outcome: ExecutionOutcome,
    delay: Duration,
}

#[async_trait]
impl Executor for ReplayExecutor {
    async fn execute(&self, task: &Task) -> grid_foundation::Result<ExecutionOutcome> {
        debug!("Replaying outcome for {} after {:?}", task.key(), self.delay);
        tokio::time::sleep(self.delay).await;
        Ok(self.outcome.clone())
    }

    async fn cancel(&self, task: &Task) -> grid_foundation::Result<()> {
        debug!("Replay of {} cancelled", task.key());
        Ok(())
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "replay"
    }
}

/// Build a task from CLI options layered over config defaults
pub fn build_task(args: &TaskArgs, defaults: &TaskDefaults) -> Task {
    let key = args
        .key
        .clone()
        .map(TaskKey::from)
        .unwrap_or_else(TaskKey::generate);
    let timeout = TaskTimeout::from(args.timeout_ms.or(defaults.timeout_ms));

    Task::with_capture(
        key,
        &args.line,
        defaults.captures_stdout() && !args.no_stdout,
        defaults.captures_stderr() && !args.no_stderr,
        timeout,
    )
}

/// Write project task defaults under `root`, returning the config path
pub fn write_project_config(root: &Path, args: &InitArgs) -> anyhow::Result<PathBuf> {
    let path = args
        .config()
        .save_project(root)
        .with_context(|| format!("Failed to write project config in {}", root.display()))?;
    debug!("Project config written to {}", path.display());
    Ok(path)
}

/// `gridtask init`
pub fn init(args: &InitArgs) -> anyhow::Result<()> {
    let root = std::env::current_dir().context("Failed to resolve current directory")?;
    let path = write_project_config(&root, args)?;
    println!("{}", path.display());
    Ok(())
}

/// `gridtask parse`
pub fn parse(line: &str) -> anyhow::Result<()> {
    let args = tokenize(line);
    println!("{}", serde_json::to_string_pretty(&args)?);
    Ok(())
}

/// `gridtask plan`
pub fn plan(args: &TaskArgs, defaults: &TaskDefaults) -> anyhow::Result<()> {
    let task = build_task(args, defaults);
    println!("{}", serde_json::to_string_pretty(&task)?);
    Ok(())
}

/// Run a task against a replayed outcome
pub async fn run_simulation(task: Task, outcome: &OutcomeArgs) -> anyhow::Result<TaskReport> {
    let executor = ReplayExecutor {
        outcome: outcome.outcome(),
        delay: Duration::from_millis(outcome.delay_ms),
    };
    let runner = TaskRunner::new(Arc::new(executor));
    let task = SharedTask::new(task);

    runner
        .run(&task)
        .await
        .with_context(|| format!("Simulation of task {} failed", task.key()))
}

/// `gridtask simulate`
pub async fn simulate(
    args: &TaskArgs,
    outcome: &OutcomeArgs,
    defaults: &TaskDefaults,
) -> anyhow::Result<()> {
    let report = run_simulation(build_task(args, defaults), outcome).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
