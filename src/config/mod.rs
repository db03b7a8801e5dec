// src/config/mod.rs

//! Configuration loading and validation.
//!
//! - [`model`] is the `serde` mapping of the TOML config file.
//! - [`loader`] reads a file and applies defaults.
//! - [`validate`] runs semantic checks (programs exist, schedules parse).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{ConfigFile, ProgramConfig, ScheduleSection};
