// src/exec/mod.rs

//! Process execution layer.
//!
//! This module launches a program's executable with `tokio::process::Command`,
//! drains both output pipes into the execution's message log, and reports the
//! classified outcome back to the schedule engine.
//!
//! - [`executor`] owns the launch path, the stream forwarders, and the
//!   supervising task that reaps the child and classifies its exit status.
//! - [`backend`] is the seam between the schedule engine and process
//!   execution, so tests can substitute a fake executor.

pub mod backend;
pub mod executor;

pub use backend::{ProcessExecutor, ProgramExecutor};
pub use executor::{ExecutionResult, execute};
