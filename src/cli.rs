// src/cli.rs

//! CLI argument parsing using `clap`, plus the environment-variable
//! helpers the entry points use.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::errors::{BuildrunError, Result};

/// Command-line arguments for `buildrun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "buildrun",
    version,
    about = "Run build commands with line-streamed, redaction-aware output.",
    long_about = None
)]
pub struct CliArgs {
    /// Write the build log to this file instead of stdout.
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Diagnostics level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BUILDRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Clone, Subcommand)]
pub enum CliCommand {
    /// Run an arbitrary command, streaming its output line by line.
    Run(RunArgs),
    /// Run the integration end-to-end tests (`make e2e_test`).
    E2e,
    /// Run the full cycle tests, mailing a report on failure.
    FullCycle,
}

/// Arguments for the generic `run` subcommand.
#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Program to execute.
    pub program: String,

    /// Arguments passed to the program.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,

    /// File fed to the child's standard input (otherwise closed).
    #[arg(long, value_name = "PATH")]
    pub stdin: Option<PathBuf>,

    /// File receiving the child's standard output (otherwise the log).
    #[arg(long, value_name = "PATH")]
    pub stdout: Option<PathBuf>,

    /// File receiving the child's standard error (otherwise the log).
    #[arg(long, value_name = "PATH")]
    pub stderr: Option<PathBuf>,

    /// KEY=VALUE pair forming part of the child's entire environment
    /// (repeatable; when given, the parent environment is not inherited).
    #[arg(long = "env", value_name = "KEY=VALUE")]
    pub env: Vec<String>,

    /// Working directory for the child.
    #[arg(long, value_name = "PATH")]
    pub cwd: Option<PathBuf>,
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

/// Reads a mandatory environment variable, failing with a descriptive
/// error when it is absent.
pub fn require_env(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| BuildrunError::MissingEnv(name.to_string()))
}

/// Reads an optional environment variable, falling back to a default.
pub fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Splits repeated `KEY=VALUE` arguments into a map.
pub fn parse_env_pairs(pairs: &[String]) -> Result<BTreeMap<String, String>> {
    let mut map = BTreeMap::new();
    for pair in pairs {
        let (name, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("invalid environment entry '{pair}', expected KEY=VALUE"))?;
        map.insert(name.to_string(), value.to_string());
    }
    Ok(map)
}
