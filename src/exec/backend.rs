// src/exec/backend.rs

//! Pluggable executor abstraction.
//!
//! The schedule engine talks to a `ProgramExecutor` instead of calling
//! [`execute`] directly. This makes it easy to drive the engine with a fake
//! executor in tests while keeping the production launch path in
//! [`executor`](super::executor).

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::errors::Result;
use crate::program::execution::Execution;
use crate::program::registry::Program;

use super::executor::{ExecutionResult, execute};

/// Trait abstracting how a program's process is launched.
///
/// Production code uses [`ProcessExecutor`]; tests can provide their own
/// implementation that records launches and reports canned outcomes without
/// spawning real processes. Implementations must publish exactly one
/// [`ExecutionResult`] per successful launch on `results_tx`.
pub trait ProgramExecutor: Send + Sync {
    fn execute(
        &self,
        program: Arc<Program>,
        results_tx: mpsc::Sender<ExecutionResult>,
    ) -> Pin<Box<dyn Future<Output = Result<Arc<Execution>>> + Send + '_>>;
}

/// Real executor used in production: spawns the program's executable as a
/// child process with piped output.
pub struct ProcessExecutor;

impl ProgramExecutor for ProcessExecutor {
    fn execute(
        &self,
        program: Arc<Program>,
        results_tx: mpsc::Sender<ExecutionResult>,
    ) -> Pin<Box<dyn Future<Output = Result<Arc<Execution>>> + Send + '_>> {
        Box::pin(execute(program, results_tx))
    }
}
