//! # grid-task
//!
//! A single unit of work submitted to a compute cluster: its command, output
//! capture policy, timeout and lifecycle state.
//!
//! ## Features
//!
//! - Shell-style command line tokenizer with quoted arguments
//! - Explicit lifecycle state machine with guarded transitions
//! - Executor contract for whatever actually runs the command
//! - Per-task locking for executors that share tasks across workers
//! - Reference runner enforcing timeouts and mapping outcomes
//!
//! ```
//! use grid_task::{Task, TaskTimeout};
//!
//! let mut task = Task::new("sim-1", "java -jar sim.jar \"run 1\"", TaskTimeout::from_secs(60));
//! assert_eq!(task.command(), ["java", "-jar", "sim.jar", "run 1"]);
//!
//! task.start().unwrap();
//! task.set_stdout(Some("done"));
//! task.finish(0).unwrap();
//!
//! assert!(task.was_successful());
//! assert_eq!(task.stdout().unwrap(), "done");
//! ```

pub mod command;
pub mod error;
pub mod executor;
pub mod report;
pub mod runner;
pub mod shared;
pub mod state;
pub mod task;

pub use command::{join, tokenize};
pub use error::{InvalidTaskRecord, OutcomeField, TaskError, Transition};
pub use executor::{ExecutionOutcome, Executor};
pub use report::TaskReport;
pub use runner::TaskRunner;
pub use shared::SharedTask;
pub use state::{TaskState, NO_EXIT_CODE};
pub use task::{OutputStream, Task, TaskKey, TaskTimeout};
