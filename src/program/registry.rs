// src/program/registry.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use crate::config::model::ConfigFile;
use crate::program::execution::Execution;

/// A registered executable unit tracked by the engine.
///
/// Owns its execution history: an append-only, chronologically ordered list
/// of runs. The launch lock serialises launches of the same program, so at
/// most one launch-and-record is in flight at a time; distinct programs are
/// fully independent.
pub struct Program {
    name: String,
    command_path: PathBuf,
    launch: Mutex<()>,
    history: Mutex<Vec<Arc<Execution>>>,
}

impl Program {
    pub fn new(name: impl Into<String>, command_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            command_path: command_path.into(),
            launch: Mutex::new(()),
            history: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn command_path(&self) -> &Path {
        &self.command_path
    }

    /// Acquire the launch lock.
    ///
    /// Executors hold this guard from before process start until the new
    /// execution has been recorded.
    pub async fn launch_guard(&self) -> MutexGuard<'_, ()> {
        self.launch.lock().await
    }

    /// Record a freshly launched execution in this program's history.
    pub async fn record(&self, execution: Arc<Execution>) {
        self.history.lock().await.push(execution);
    }

    /// Snapshot of the execution history, oldest first.
    ///
    /// Observers get cloned handles rather than references into the guarded
    /// list, so a concurrent launch can never tear the read.
    pub async fn executions(&self) -> Vec<Arc<Execution>> {
        self.history.lock().await.clone()
    }
}

/// All programs known to the engine, keyed by name.
pub struct Registry {
    programs: BTreeMap<String, Arc<Program>>,
}

impl Registry {
    /// Build the registry from a validated [`ConfigFile`].
    pub fn from_config(cfg: &ConfigFile) -> Self {
        let mut programs = BTreeMap::new();

        for (name, pc) in cfg.program.iter() {
            let program = Arc::new(Program::new(name.clone(), &pc.command));
            programs.insert(name.clone(), program);
        }

        Self { programs }
    }

    pub fn get(&self, name: &str) -> Option<Arc<Program>> {
        self.programs.get(name).cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Program>> {
        self.programs.values()
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}
