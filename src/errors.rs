// src/errors.rs

//! Crate-wide error aliases.
//!
//! Everything in `dayrun` reports errors through `anyhow`; this module is the
//! single place to introduce more structured error types if a collaborator
//! ever needs to match on failure causes.

pub use anyhow::{Error, Result};
