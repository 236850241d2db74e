// src/make.rs

//! Helper for running `make` with variable assignments and targets.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::errors::Result;
use crate::exec::Command;
use crate::logger::Logger;

/// Wraps a [`Command`] fixed to `make`, adding `NAME=value` variable
/// handling on top of the plain argument vector.
pub struct Make {
    command: Command,
    common_variables: BTreeMap<String, String>,
}

impl Make {
    pub fn new(log: Logger) -> Self {
        Self::with_program(log, "make")
    }

    /// Uses an alternative `make` executable, e.g. a CI-provided `$MAKE`.
    pub fn with_program(log: Logger, program: impl Into<String>) -> Self {
        Self {
            command: Command::new(log, program),
            common_variables: BTreeMap::new(),
        }
    }

    /// Replaces the child's environment, as in [`Command::env`].
    pub fn env(mut self, env: BTreeMap<String, String>) -> Self {
        self.command = self.command.env(env);
        self
    }

    /// Sets the directory `make` runs in.
    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.command = self.command.cwd(dir);
        self
    }

    /// Variables passed to every invocation. Per-call variables win on
    /// name collisions.
    pub fn common_variables(mut self, variables: BTreeMap<String, String>) -> Self {
        self.common_variables = variables;
        self
    }

    /// Renders the argument list: merged `NAME=value` assignments first,
    /// then the target names. Pure; no I/O.
    pub fn render_args(
        &self,
        targets: &[String],
        variables: &BTreeMap<String, String>,
    ) -> Vec<String> {
        let mut merged = self.common_variables.clone();
        for (name, value) in variables {
            merged.insert(name.clone(), value.clone());
        }
        let mut args: Vec<String> = merged
            .into_iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        args.extend(targets.iter().cloned());
        args
    }

    /// Runs `make` with the given targets and variables and returns its
    /// exit status.
    pub async fn run(
        &self,
        targets: &[String],
        variables: &BTreeMap<String, String>,
    ) -> Result<i32> {
        self.command.run(&self.render_args(targets, variables)).await
    }

    /// Like [`run`](Make::run), but a non-zero exit status is an error.
    pub async fn check(
        &self,
        targets: &[String],
        variables: &BTreeMap<String, String>,
    ) -> Result<()> {
        self.command
            .check(&self.render_args(targets, variables))
            .await
    }
}
