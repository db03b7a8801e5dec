// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod program;
pub mod schedule;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use tracing::info;

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::exec::{ProcessExecutor, ProgramExecutor};
use crate::program::Registry;
use crate::schedule::{Engine, ProgramSchedule};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the program registry
/// - the process executor
/// - the schedule engine
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let mut cfg = load_and_validate(&config_path)?;

    if let Some(ref name) = args.program {
        if !cfg.program.contains_key(name) {
            return Err(anyhow!(
                "program '{}' not found in {:?}",
                name,
                config_path
            ));
        }
        let keep = name.clone();
        cfg.program.retain(|n, _| *n == keep);
    }

    if args.dry_run {
        print_dry_run(&cfg)?;
        return Ok(());
    }

    let registry = Arc::new(Registry::from_config(&cfg));
    let executor: Arc<dyn ProgramExecutor> = Arc::new(ProcessExecutor);
    let engine = Engine::from_config(&cfg, registry.clone(), executor)?;

    info!(
        programs = registry.len(),
        config = %config_path.display(),
        "dayrun starting"
    );

    if args.once {
        engine.run(true).await
    } else {
        // Ctrl-C → graceful shutdown. In-flight children are killed on drop.
        tokio::select! {
            res = engine.run(false) => res,
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown requested, stopping");
                Ok(())
            }
        }
    }
}

/// Simple dry-run output: print programs and their effective schedules.
fn print_dry_run(cfg: &ConfigFile) -> Result<()> {
    println!("dayrun dry-run");
    println!("  schedule.daily_at = {}", cfg.schedule.daily_at);
    println!("  schedule.retry_delay = {}", cfg.schedule.retry_delay);
    println!();

    println!("programs ({}):", cfg.program.len());
    for (name, program) in cfg.program.iter() {
        let resolved = ProgramSchedule::resolve(&cfg.schedule, Some(program))?;
        println!("  - {name}");
        println!("      command: {}", program.command);
        println!(
            "      runs at: {} (retry delay {:?})",
            resolved.daily_at, resolved.retry_delay
        );
    }

    Ok(())
}
