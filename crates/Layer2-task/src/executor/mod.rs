//! Executor contract
//!
//! The executor is the collaborator that actually runs a task's command on a
//! cluster node. This crate only defines what it must report back:
//! - `Executor` - async trait implemented by execution backends
//! - `ExecutionOutcome` - how the command ended, plus captured output

pub mod outcome;
pub mod r#trait;

pub use outcome::ExecutionOutcome;
pub use r#trait::Executor;
