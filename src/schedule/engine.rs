// src/schedule/engine.rs

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::{Local, NaiveTime};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinSet;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::model::{ConfigFile, ProgramConfig, ScheduleSection};
use crate::exec::backend::ProgramExecutor;
use crate::exec::executor::ExecutionResult;
use crate::program::outcome::Outcome;
use crate::program::registry::{Program, Registry};
use crate::schedule::clock;

/// Capacity of the engine's status event channel.
const STATUS_BUFFER_SIZE: usize = 256;

/// Resolved schedule for one program: global `[schedule]` defaults with any
/// per-program overrides applied, parsed into their working types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramSchedule {
    pub daily_at: NaiveTime,
    pub retry_delay: Duration,
}

impl ProgramSchedule {
    /// Resolve the effective schedule, parsing the config's string fields.
    ///
    /// With `program = None` this checks the global defaults themselves,
    /// which is how config validation exercises the `[schedule]` section.
    pub fn resolve(defaults: &ScheduleSection, program: Option<&ProgramConfig>) -> Result<Self> {
        let daily_at_str = match program {
            Some(p) => p.effective_daily_at(defaults),
            None => defaults.daily_at.as_str(),
        };
        let retry_delay_str = match program {
            Some(p) => p.effective_retry_delay(defaults),
            None => defaults.retry_delay.as_str(),
        };

        let daily_at = clock::parse_daily_at(daily_at_str).map_err(|e| anyhow!(e))?;
        let retry_delay = clock::parse_duration(retry_delay_str).map_err(|e| anyhow!(e))?;

        Ok(Self {
            daily_at,
            retry_delay,
        })
    }
}

/// Where a program stands in its current day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayState {
    /// Waiting for the daily trigger.
    Idle,
    /// Trigger fired; a launch is about to happen.
    Due,
    /// An execution is in flight.
    Running,
    /// The last run asked for a retry; the delay timer is armed.
    RetryScheduled,
    /// Terminal for the day (success or failure); next trigger re-arms.
    DoneToday,
}

/// What the driver should do after an outcome lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    DoneForToday,
    RetryAfterDelay,
}

/// The per-program day state machine.
///
/// Pure transition logic, synchronously testable; the async driver owns the
/// timers and the executor. One instance exists per program and is the sole
/// writer of that program's schedule state.
#[derive(Debug)]
pub struct DayStateMachine {
    program: String,
    state: DayState,
}

impl DayStateMachine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            state: DayState::Idle,
        }
    }

    pub fn state(&self) -> DayState {
        self.state
    }

    /// The daily trigger fired. Returns whether a launch should happen.
    ///
    /// A program still `Running` or `RetryScheduled` from the prior day is
    /// left alone: completion wins over strict daily boundaries, and the
    /// trigger that matters next is the one after its work ends.
    pub fn trigger_fired(&mut self) -> bool {
        match self.state {
            DayState::Idle | DayState::DoneToday => {
                debug!(program = %self.program, "daily trigger; program due");
                self.state = DayState::Due;
                true
            }
            DayState::Due | DayState::Running | DayState::RetryScheduled => {
                debug!(
                    program = %self.program,
                    state = ?self.state,
                    "daily trigger ignored; earlier work still in progress"
                );
                false
            }
        }
    }

    /// An execution was launched.
    pub fn launch_started(&mut self) {
        if self.state != DayState::Due {
            warn!(
                program = %self.program,
                state = ?self.state,
                "launch recorded outside the Due state"
            );
        }
        self.state = DayState::Running;
    }

    /// The launch itself failed: no execution exists, nothing to wait for.
    /// The next daily trigger is the retry for launch errors.
    pub fn launch_failed(&mut self) {
        self.state = DayState::Idle;
    }

    /// The in-flight execution reached its terminal status.
    pub fn outcome_received(&mut self, outcome: Outcome) -> RetryDecision {
        if self.state != DayState::Running {
            warn!(
                program = %self.program,
                state = ?self.state,
                "outcome received outside the Running state"
            );
        }

        if outcome.requests_retry() {
            self.state = DayState::RetryScheduled;
            RetryDecision::RetryAfterDelay
        } else {
            self.state = DayState::DoneToday;
            RetryDecision::DoneForToday
        }
    }

    /// The retry delay elapsed. Returns whether a launch should happen.
    pub fn retry_delay_elapsed(&mut self) -> bool {
        match self.state {
            DayState::RetryScheduled => {
                self.state = DayState::Due;
                true
            }
            _ => {
                warn!(
                    program = %self.program,
                    state = ?self.state,
                    "retry timer fired outside the RetryScheduled state; ignoring"
                );
                false
            }
        }
    }
}

/// A schedule-state change, published for observers (dashboards, log
/// viewers). Observers never mutate engine state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEvent {
    pub program: String,
    pub change: StatusChange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusChange {
    Due,
    ExecutionStarted { id: Uuid },
    ExecutionFinished { id: Uuid, outcome: Outcome },
    RetryArmed { delay: Duration },
}

/// The schedule engine: one state machine task per program, for the
/// process lifetime of the service.
///
/// Each task is the sole caller of the executor for its program; distinct
/// programs share no mutable state, so one program's failure (or hang)
/// never touches another's schedule.
pub struct Engine {
    registry: Arc<Registry>,
    schedules: BTreeMap<String, ProgramSchedule>,
    executor: Arc<dyn ProgramExecutor>,
    status_tx: broadcast::Sender<StatusEvent>,
}

impl Engine {
    /// Construct the engine from a validated config and a built registry.
    pub fn from_config(
        cfg: &ConfigFile,
        registry: Arc<Registry>,
        executor: Arc<dyn ProgramExecutor>,
    ) -> Result<Self> {
        let mut schedules = BTreeMap::new();

        for (name, pc) in cfg.program.iter() {
            let schedule = ProgramSchedule::resolve(&cfg.schedule, Some(pc))
                .with_context(|| format!("resolving schedule for program '{}'", name))?;
            schedules.insert(name.clone(), schedule);
        }

        let (status_tx, _) = broadcast::channel(STATUS_BUFFER_SIZE);

        Ok(Self {
            registry,
            schedules,
            executor,
            status_tx,
        })
    }

    /// Attach a status observer. The receiver sees subsequent state changes.
    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.status_tx.subscribe()
    }

    /// Run every program's state machine.
    ///
    /// With `once = true`, each program is triggered immediately, driven
    /// through retries to its terminal day state, and the call returns when
    /// all programs are done. Otherwise the machines run forever on their
    /// daily triggers.
    pub async fn run(&self, once: bool) -> Result<()> {
        info!(programs = self.registry.len(), once, "schedule engine started");

        let mut machines = JoinSet::new();

        for program in self.registry.iter() {
            let Some(schedule) = self.schedules.get(program.name()).copied() else {
                warn!(program = %program.name(), "program missing from schedule table; skipping");
                continue;
            };

            machines.spawn(run_program(
                program.clone(),
                schedule,
                self.executor.clone(),
                self.status_tx.clone(),
                once,
            ));
        }

        while let Some(joined) = machines.join_next().await {
            if let Err(err) = joined {
                error!(error = %err, "program state machine task failed");
            }
        }

        info!("schedule engine exiting");
        Ok(())
    }
}

/// Drive one program's day state machine for the life of the service.
async fn run_program(
    program: Arc<Program>,
    schedule: ProgramSchedule,
    executor: Arc<dyn ProgramExecutor>,
    status_tx: broadcast::Sender<StatusEvent>,
    once: bool,
) {
    let mut machine = DayStateMachine::new(program.name());

    // Outcomes arrive one at a time: the machine never launches a second
    // execution before the first one's result has been consumed.
    let (results_tx, mut results_rx) = mpsc::channel::<ExecutionResult>(1);

    loop {
        if !once {
            let now = Local::now();
            let at = clock::next_trigger(&now, schedule.daily_at);
            let wait = (at - now).to_std().unwrap_or(Duration::ZERO);
            debug!(program = %program.name(), trigger = %at, "waiting for daily trigger");
            sleep(wait).await;
        }

        if !machine.trigger_fired() {
            continue;
        }
        emit(&status_tx, &program, StatusChange::Due);

        // Drive this day's work to a terminal state, looping through retries.
        loop {
            match executor.execute(program.clone(), results_tx.clone()).await {
                Ok(execution) => {
                    machine.launch_started();
                    emit(
                        &status_tx,
                        &program,
                        StatusChange::ExecutionStarted { id: execution.id() },
                    );

                    let result = match results_rx.recv().await {
                        Some(result) => result,
                        None => {
                            // We hold a sender, so this only happens if the
                            // executor dropped the queue without reporting.
                            warn!(
                                program = %program.name(),
                                "executor stopped without reporting an outcome"
                            );
                            ExecutionResult {
                                program: program.name().to_string(),
                                execution: execution.clone(),
                                outcome: Outcome::InternalError,
                            }
                        }
                    };

                    emit(
                        &status_tx,
                        &program,
                        StatusChange::ExecutionFinished {
                            id: result.execution.id(),
                            outcome: result.outcome,
                        },
                    );

                    match machine.outcome_received(result.outcome) {
                        RetryDecision::RetryAfterDelay => {
                            info!(
                                program = %program.name(),
                                delay = ?schedule.retry_delay,
                                "retry requested; re-running after delay"
                            );
                            emit(
                                &status_tx,
                                &program,
                                StatusChange::RetryArmed {
                                    delay: schedule.retry_delay,
                                },
                            );
                            sleep(schedule.retry_delay).await;
                            machine.retry_delay_elapsed();
                            emit(&status_tx, &program, StatusChange::Due);
                        }
                        RetryDecision::DoneForToday => {
                            info!(
                                program = %program.name(),
                                outcome = ?result.outcome,
                                "done for today"
                            );
                            break;
                        }
                    }
                }
                Err(err) => {
                    error!(program = %program.name(), error = %err, "failed to launch program");
                    machine.launch_failed();
                    break;
                }
            }
        }

        if once {
            break;
        }
    }
}

fn emit(status_tx: &broadcast::Sender<StatusEvent>, program: &Program, change: StatusChange) {
    // No observers attached is fine.
    let _ = status_tx.send(StatusEvent {
        program: program.name().to_string(),
        change,
    });
}
