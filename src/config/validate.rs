// src/config/validate.rs

use anyhow::{Context, Result, anyhow};

use crate::config::model::ConfigFile;
use crate::schedule::ProgramSchedule;

/// Run basic semantic validation against a loaded configuration.
///
/// This checks:
/// - there is at least one program
/// - program names and command paths are non-empty
/// - the global `[schedule]` section parses (`HH:MM` time, duration string)
/// - every per-program override parses as well
///
/// It does **not** check that command paths exist or are executable; the
/// executor reports that at launch time, and the next daily trigger retries.
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    ensure_has_programs(cfg)?;
    validate_programs(cfg)?;
    validate_schedules(cfg)?;
    Ok(())
}

fn ensure_has_programs(cfg: &ConfigFile) -> Result<()> {
    if cfg.program.is_empty() {
        return Err(anyhow!(
            "config must contain at least one [program.<name>] section"
        ));
    }
    Ok(())
}

fn validate_programs(cfg: &ConfigFile) -> Result<()> {
    for (name, program) in cfg.program.iter() {
        if name.trim().is_empty() {
            return Err(anyhow!("program names must not be empty"));
        }
        if program.command.trim().is_empty() {
            return Err(anyhow!("program '{}' has an empty `command` path", name));
        }
    }
    Ok(())
}

fn validate_schedules(cfg: &ConfigFile) -> Result<()> {
    ProgramSchedule::resolve(&cfg.schedule, None).context("invalid [schedule] section")?;

    for (name, program) in cfg.program.iter() {
        ProgramSchedule::resolve(&cfg.schedule, Some(program))
            .with_context(|| format!("invalid schedule for program '{}'", name))?;
    }

    Ok(())
}
