// src/program/outcome.rs

use crate::program::execution::Status;

/// Final classification of one execution, as delivered to the schedule
/// engine.
///
/// The exit-code contract programs must honour: `0` = done for the day,
/// `1` = please re-run me after a delay, `2` = failed for the day. Any other
/// exit code is treated as `Failed`; an exit status that carries no code at
/// all (signal death, a failed wait) is `InternalError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Retry,
    Failed,
    InternalError,
}

impl Outcome {
    /// Classify a decoded OS exit code.
    ///
    /// Kept platform-neutral: callers decide how to extract the code from an
    /// `ExitStatus` (and fall back to [`Outcome::InternalError`] when they
    /// cannot).
    pub fn from_exit_code(code: i32) -> Self {
        match code {
            0 => Outcome::Success,
            1 => Outcome::Retry,
            _ => Outcome::Failed,
        }
    }

    /// The terminal [`Status`] this outcome pins on the execution record.
    pub fn as_status(self) -> Status {
        match self {
            Outcome::Success => Status::Success,
            Outcome::Retry => Status::Retry,
            Outcome::Failed => Status::Failed,
            Outcome::InternalError => Status::InternalError,
        }
    }

    /// Whether the schedule engine should arm a delayed re-run.
    ///
    /// Everything except `Retry` is terminal for the day; `InternalError` is
    /// treated like `Failed` for scheduling purposes.
    pub fn requests_retry(self) -> bool {
        matches!(self, Outcome::Retry)
    }
}
