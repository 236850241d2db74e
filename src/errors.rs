// src/errors.rs

//! Crate-wide error type and `Result` alias.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildrunError {
    /// A command run through `Command::check` exited with a non-zero status.
    #[error("command exited with status {status}")]
    CommandFailed { status: i32 },

    /// A command run through `Command::eval` exited with a non-zero status.
    #[error("command '{command}' exited with status {status}")]
    EvalFailed { command: String, status: i32 },

    /// A mandatory environment variable was not set.
    #[error("environment variable '{0}' is mandatory")]
    MissingEnv(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, BuildrunError>;
