//! GridTask CLI - Main entry point

mod cli;

use clap::{Parser, Subcommand};
use grid_foundation::GridConfig;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// GridTask - inspect and simulate cluster task lifecycles
#[derive(Parser, Debug)]
#[command(name = "gridtask")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Load configuration from this file instead of the global/project files
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write task defaults to .gridtask/config.json in the current directory
    Init {
        #[command(flatten)]
        defaults: cli::InitArgs,
    },
    /// Print the argument vector a command line tokenizes to
    Parse {
        /// Command line to tokenize
        line: String,
    },
    /// Print the task that would be submitted for a command line
    Plan {
        #[command(flatten)]
        task: cli::TaskArgs,
    },
    /// Drive a task through its lifecycle with a simulated outcome
    Simulate {
        #[command(flatten)]
        task: cli::TaskArgs,

        #[command(flatten)]
        outcome: cli::OutcomeArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging (stderr, stdout carries JSON)
    let log_level = if args.debug { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    // Load configuration
    let config = match &args.config {
        Some(path) => GridConfig::load_from(path)?,
        None => GridConfig::load().unwrap_or_else(|e| {
            eprintln!("Warning: Failed to load config: {}", e);
            GridConfig::default()
        }),
    };
    tracing::debug!("Task defaults: {:?}", config.task);

    match args.command {
        Command::Init { defaults } => cli::init(&defaults),
        Command::Parse { line } => cli::parse(&line),
        Command::Plan { task } => cli::plan(&task, &config.task),
        Command::Simulate { task, outcome } => cli::simulate(&task, &outcome, &config.task).await,
    }
}
