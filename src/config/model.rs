// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [schedule]
/// daily_at = "08:00"
/// retry_delay = "10m"
///
/// [program.backup]
/// command = "/srv/jobs/backup/main"
///
/// [program.report]
/// command = "/srv/jobs/report/main"
/// daily_at = "06:30"
/// ```
///
/// The `[schedule]` section is optional and has compiled-in defaults; every
/// program may override the trigger time and retry delay individually.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    /// Global scheduling defaults from `[schedule]`.
    #[serde(default)]
    pub schedule: ScheduleSection,

    /// All programs from `[program.<name>]`.
    ///
    /// Keys are the *program names* (e.g. `"backup"`, `"report"`).
    #[serde(default)]
    pub program: BTreeMap<String, ProgramConfig>,
}

/// `[schedule]` section: when programs run and how retry backoff behaves.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleSection {
    /// Local time of day at which the daily trigger fires, as `HH:MM`.
    #[serde(default = "default_daily_at")]
    pub daily_at: String,

    /// How long to wait before re-running a program that exited with the
    /// retry code, as a duration string (`"30s"`, `"10m"`, ...).
    #[serde(default = "default_retry_delay")]
    pub retry_delay: String,
}

fn default_daily_at() -> String {
    "08:00".to_string()
}

fn default_retry_delay() -> String {
    "10m".to_string()
}

impl Default for ScheduleSection {
    fn default() -> Self {
        Self {
            daily_at: default_daily_at(),
            retry_delay: default_retry_delay(),
        }
    }
}

/// `[program.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ProgramConfig {
    /// Path to the executable to run, invoked with no arguments.
    pub command: String,

    /// Optional program-local trigger time.
    ///
    /// If `None`, the program uses `schedule.daily_at`.
    #[serde(default)]
    pub daily_at: Option<String>,

    /// Optional program-local retry delay.
    ///
    /// If `None`, the program uses `schedule.retry_delay`.
    #[serde(default)]
    pub retry_delay: Option<String>,
}

impl ProgramConfig {
    /// Convenience: the effective trigger time string for this program.
    pub fn effective_daily_at<'a>(&'a self, defaults: &'a ScheduleSection) -> &'a str {
        self.daily_at.as_deref().unwrap_or(&defaults.daily_at)
    }

    /// Convenience: the effective retry delay string for this program.
    pub fn effective_retry_delay<'a>(&'a self, defaults: &'a ScheduleSection) -> &'a str {
        self.retry_delay.as_deref().unwrap_or(&defaults.retry_delay)
    }
}
