use std::collections::{BTreeMap, VecDeque};
use std::error::Error;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use dayrun::config::{ConfigFile, ProgramConfig, ScheduleSection};
use dayrun::errors::Result;
use dayrun::exec::{ExecutionResult, ProgramExecutor};
use dayrun::program::{Execution, MessageKind, Outcome, Program, Registry, Status};
use dayrun::schedule::{Engine, StatusChange};

type TestResult = std::result::Result<(), Box<dyn Error>>;

/// A fake executor that reports scripted outcomes per program without
/// spawning real processes, while still recording executions the way the
/// production launch path does.
struct FakeExecutor {
    scripts: Mutex<BTreeMap<String, VecDeque<Outcome>>>,
}

impl FakeExecutor {
    fn scripted<const N: usize>(scripts: [(&str, &[Outcome]); N]) -> Self {
        let scripts = scripts
            .into_iter()
            .map(|(name, outcomes)| (name.to_string(), outcomes.iter().copied().collect()))
            .collect();
        Self {
            scripts: Mutex::new(scripts),
        }
    }
}

impl ProgramExecutor for FakeExecutor {
    fn execute(
        &self,
        program: Arc<Program>,
        results_tx: mpsc::Sender<ExecutionResult>,
    ) -> Pin<Box<dyn Future<Output = Result<Arc<Execution>>> + Send + '_>> {
        let outcome = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(program.name())
            .and_then(|script| script.pop_front());

        Box::pin(async move {
            let outcome =
                outcome.ok_or_else(|| anyhow::anyhow!("no scripted outcome left"))?;

            let guard = program.launch_guard().await;
            let execution = Arc::new(Execution::new(program.name()));
            program.record(execution.clone()).await;
            drop(guard);

            let name = program.name().to_string();
            let handle = execution.clone();
            tokio::spawn(async move {
                match outcome {
                    Outcome::Success => {
                        handle
                            .append(MessageKind::Ok, "successfully completed")
                            .await
                    }
                    _ => handle.append(MessageKind::Fail, "scripted failure").await,
                }
                handle.finish(outcome.as_status()).await;

                let _ = results_tx
                    .send(ExecutionResult {
                        program: name,
                        execution: handle.clone(),
                        outcome,
                    })
                    .await;
            });

            Ok(execution)
        })
    }
}

fn config_with_programs(names: &[&str]) -> ConfigFile {
    let mut program = BTreeMap::new();
    for name in names {
        program.insert(
            name.to_string(),
            ProgramConfig {
                command: format!("/srv/jobs/{name}/main"),
                daily_at: None,
                retry_delay: Some("10ms".to_string()),
            },
        );
    }

    ConfigFile {
        schedule: ScheduleSection::default(),
        program,
    }
}

#[tokio::test]
async fn retry_then_success_yields_two_executions() -> TestResult {
    let cfg = config_with_programs(&["nightly"]);
    let registry = Arc::new(Registry::from_config(&cfg));
    let executor: Arc<dyn ProgramExecutor> = Arc::new(FakeExecutor::scripted([(
        "nightly",
        &[Outcome::Retry, Outcome::Success][..],
    )]));
    let engine = Engine::from_config(&cfg, registry.clone(), executor)?;

    engine.run(true).await?;

    let program = registry.get("nightly").ok_or("program not registered")?;
    let executions = program.executions().await;
    assert_eq!(executions.len(), 2);
    assert_eq!(executions[0].status().await, Status::Retry);
    assert_eq!(executions[1].status().await, Status::Success);

    Ok(())
}

#[tokio::test]
async fn failure_ends_the_day_without_a_retry() -> TestResult {
    let cfg = config_with_programs(&["brittle"]);
    let registry = Arc::new(Registry::from_config(&cfg));

    // A single scripted outcome: a second launch would error the engine.
    let executor: Arc<dyn ProgramExecutor> =
        Arc::new(FakeExecutor::scripted([("brittle", &[Outcome::Failed][..])]));
    let engine = Engine::from_config(&cfg, registry.clone(), executor)?;

    engine.run(true).await?;

    let program = registry.get("brittle").ok_or("program not registered")?;
    let executions = program.executions().await;
    assert_eq!(executions.len(), 1);
    assert_eq!(executions[0].status().await, Status::Failed);

    Ok(())
}

#[tokio::test]
async fn one_failing_program_does_not_halt_another() -> TestResult {
    let cfg = config_with_programs(&["good", "bad"]);
    let registry = Arc::new(Registry::from_config(&cfg));
    let executor: Arc<dyn ProgramExecutor> = Arc::new(FakeExecutor::scripted([
        ("good", &[Outcome::Success][..]),
        ("bad", &[Outcome::InternalError][..]),
    ]));
    let engine = Engine::from_config(&cfg, registry.clone(), executor)?;

    engine.run(true).await?;

    let good = registry.get("good").ok_or("missing program")?;
    assert_eq!(good.executions().await[0].status().await, Status::Success);

    let bad = registry.get("bad").ok_or("missing program")?;
    assert_eq!(
        bad.executions().await[0].status().await,
        Status::InternalError
    );

    Ok(())
}

#[tokio::test]
async fn launch_failure_leaves_history_empty() -> TestResult {
    let cfg = config_with_programs(&["ghost"]);
    let registry = Arc::new(Registry::from_config(&cfg));

    // No scripted outcome at all: every launch attempt fails synchronously.
    let executor: Arc<dyn ProgramExecutor> = Arc::new(FakeExecutor::scripted([]));
    let engine = Engine::from_config(&cfg, registry.clone(), executor)?;

    engine.run(true).await?;

    let program = registry.get("ghost").ok_or("missing program")?;
    assert!(program.executions().await.is_empty());

    Ok(())
}

#[tokio::test]
async fn status_events_trace_the_retry_loop() -> TestResult {
    let cfg = config_with_programs(&["nightly"]);
    let registry = Arc::new(Registry::from_config(&cfg));
    let executor: Arc<dyn ProgramExecutor> = Arc::new(FakeExecutor::scripted([(
        "nightly",
        &[Outcome::Retry, Outcome::Success][..],
    )]));
    let engine = Engine::from_config(&cfg, registry, executor)?;

    let mut events = engine.subscribe();
    engine.run(true).await?;

    let mut changes = Vec::new();
    while let Ok(event) = events.try_recv() {
        changes.push(event.change);
    }

    assert_eq!(changes.len(), 7);
    assert!(matches!(changes[0], StatusChange::Due));
    assert!(matches!(changes[1], StatusChange::ExecutionStarted { .. }));
    assert!(matches!(
        changes[2],
        StatusChange::ExecutionFinished {
            outcome: Outcome::Retry,
            ..
        }
    ));
    assert!(matches!(changes[3], StatusChange::RetryArmed { .. }));
    assert!(matches!(changes[4], StatusChange::Due));
    assert!(matches!(changes[5], StatusChange::ExecutionStarted { .. }));
    assert!(matches!(
        changes[6],
        StatusChange::ExecutionFinished {
            outcome: Outcome::Success,
            ..
        }
    ));

    Ok(())
}
