// src/cli.rs

//! CLI argument parsing using `clap` (derive feature).

use clap::{Parser, ValueEnum};

/// Command-line arguments for `dayrun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "dayrun",
    version,
    about = "Run each configured program once per day, capturing output and retrying on request.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Dayrun.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Dayrun.toml")]
    pub config: String,

    /// Run every program once immediately (honouring retry requests), then exit.
    #[arg(long)]
    pub once: bool,

    /// Restrict the run to a single program from the config.
    #[arg(long, value_name = "NAME")]
    pub program: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DAYRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print programs and their schedules, but don't execute.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
