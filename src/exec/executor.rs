// src/exec/executor.rs

use std::process::Stdio;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::program::execution::{Execution, MessageKind};
use crate::program::outcome::Outcome;
use crate::program::registry::Program;

/// Final classification of one execution, published on the result queue the
/// schedule engine consumes.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub program: String,
    pub execution: Arc<Execution>,
    pub outcome: Outcome,
}

/// Launch one run of `program` and return the in-flight execution handle.
///
/// Fails synchronously (pipe setup, process start) without creating or
/// recording an execution; the caller's next daily trigger is the retry for
/// launch failures. On success the execution is recorded in the program's
/// history, under the launch lock, before the handle is returned, so
/// observers see the in-flight run immediately.
///
/// The supervising task waits for **both** stream forwarders to signal
/// end-of-stream before reaping the child: waiting earlier could lose
/// buffered output or deadlock the child on a full pipe buffer. There is
/// deliberately no run timeout; a hung child hangs only its own program's
/// schedule.
pub async fn execute(
    program: Arc<Program>,
    results_tx: mpsc::Sender<ExecutionResult>,
) -> Result<Arc<Execution>> {
    let _guard = program.launch_guard().await;

    info!(program = %program.name(), command = %program.command_path().display(), "launching process");

    let mut cmd = Command::new(program.command_path());
    cmd.stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning process for program '{}'", program.name()))?;

    let stdout = child
        .stdout
        .take()
        .context("stdout pipe missing on spawned child")?;
    let stderr = child
        .stderr
        .take()
        .context("stderr pipe missing on spawned child")?;

    let execution = Arc::new(Execution::new(program.name()));

    let (stdout_done_tx, stdout_done_rx) = oneshot::channel();
    let (stderr_done_tx, stderr_done_rx) = oneshot::channel();

    tokio::spawn(forward_stream(
        execution.clone(),
        MessageKind::Out,
        stdout,
        stdout_done_tx,
    ));
    tokio::spawn(forward_stream(
        execution.clone(),
        MessageKind::Err,
        stderr,
        stderr_done_tx,
    ));

    {
        let execution = execution.clone();
        tokio::spawn(async move {
            // Both pipes must be fully drained before wait(); a closed
            // completion channel (forwarder died) counts as drained.
            let _ = stdout_done_rx.await;
            let _ = stderr_done_rx.await;

            let outcome = classify_and_annotate(&execution, child.wait().await).await;
            execution.finish(outcome.as_status()).await;

            let result = ExecutionResult {
                program: execution.program().to_string(),
                execution: execution.clone(),
                outcome,
            };
            if results_tx.send(result).await.is_err() {
                debug!(
                    program = %execution.program(),
                    "result receiver dropped; discarding outcome"
                );
            }
        });
    }

    program.record(execution.clone()).await;

    Ok(execution)
}

/// Translate the reaped exit status into an [`Outcome`], appending the
/// corresponding "ok"/"fail" annotation to the execution's log.
async fn classify_and_annotate(
    execution: &Execution,
    wait_result: std::io::Result<std::process::ExitStatus>,
) -> Outcome {
    match wait_result {
        Ok(status) if status.success() => {
            info!(program = %execution.program(), "process completed successfully");
            execution
                .append(MessageKind::Ok, "successfully completed")
                .await;
            Outcome::Success
        }
        Ok(status) => match status.code() {
            Some(code) => {
                let outcome = Outcome::from_exit_code(code);
                if outcome == Outcome::Failed && code != 2 {
                    warn!(
                        program = %execution.program(),
                        exit_code = code,
                        "process exited with a code outside the contract; treating as failed"
                    );
                } else {
                    info!(program = %execution.program(), exit_code = code, ?outcome, "process exited");
                }
                execution
                    .append(MessageKind::Fail, format!("exited with status {code}"))
                    .await;
                outcome
            }
            None => {
                // Killed by a signal, or a platform with no extractable code.
                warn!(program = %execution.program(), status = %status, "exit status carried no code");
                execution
                    .append(MessageKind::Fail, format!("failed to run: {status}"))
                    .await;
                Outcome::InternalError
            }
        },
        Err(err) => {
            error!(program = %execution.program(), error = %err, "failed to reap process");
            execution
                .append(MessageKind::Fail, format!("failed to run: {err}"))
                .await;
            Outcome::InternalError
        }
    }
}

/// Drain one output stream line-by-line into the execution's log.
///
/// Each line is appended, in arrival order, before the next one is read. EOF
/// and read errors both signal completion on `done`; a read error is an
/// operational warning only, since the process exit status alone determines
/// the outcome.
async fn forward_stream<R>(
    execution: Arc<Execution>,
    kind: MessageKind,
    reader: R,
    done: oneshot::Sender<()>,
) where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut lines = BufReader::new(reader).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => execution.append(kind, line).await,
            Ok(None) => break,
            Err(err) => {
                warn!(
                    program = %execution.program(),
                    stream = kind.tag(),
                    error = %err,
                    "stream read error"
                );
                break;
            }
        }
    }

    let _ = done.send(());
}
