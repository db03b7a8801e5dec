// src/schedule/mod.rs

//! Daily scheduling and retry backoff.
//!
//! - [`clock`] computes the next daily trigger instant and parses the small
//!   time/duration formats the config uses.
//! - [`engine`] contains the per-program day state machine and the async
//!   driver that owns its timers and the executor's result queue.

pub mod clock;
pub mod engine;

pub use engine::{
    DayState, DayStateMachine, Engine, ProgramSchedule, RetryDecision, StatusChange, StatusEvent,
};
