// src/logger.rs

//! Redaction-aware logger used as the default destination for command output.
//!
//! This is a *domain* logger, distinct from the `tracing` diagnostics set up
//! in [`crate::logging`]: build jobs write their progress (and the streamed
//! output of child processes without an explicit destination file) through
//! it, and secrets such as tokens are registered up front so they never
//! appear in the log.
//!
//! The handle is cheap to clone and safe to share; concurrent `info` calls
//! are serialized internally.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Replacement text for redacted values.
const MASK: &str = "***";

/// Shared, redaction-aware line logger writing to stdout or a file.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    redacted: BTreeSet<String>,
    target: Target,
}

enum Target {
    Stdout,
    File(File),
}

impl Logger {
    /// Creates a logger that writes to the standard output of this process.
    pub fn to_stdout() -> Self {
        Self::with_target(Target::Stdout)
    }

    /// Creates a logger that writes to the given file, creating or
    /// truncating it.
    pub fn to_file(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self::with_target(Target::File(file)))
    }

    fn with_target(target: Target) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                redacted: BTreeSet::new(),
                target,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned lock only means another thread panicked mid-write;
        // the inner state is still usable for logging.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Writes one line to the log, substituting every registered redaction
    /// value with `***` first. The destination is flushed per line so the
    /// log stays readable while a child process is still running.
    pub fn info(&self, message: &str) -> io::Result<()> {
        let mut inner = self.lock();
        let line = inner.apply_redactions(message);
        match &mut inner.target {
            Target::Stdout => {
                let mut out = io::stdout().lock();
                writeln!(out, "{line}")?;
                out.flush()
            }
            Target::File(file) => {
                writeln!(file, "{line}")?;
                file.flush()
            }
        }
    }

    /// Registers a value to be masked in all future `info` calls.
    ///
    /// Registering the empty string is a no-op (it would match everywhere).
    pub fn redact(&self, value: &str) {
        if !value.is_empty() {
            self.lock().redacted.insert(value.to_string());
        }
    }

    /// Flushes and releases the underlying file, if one was opened.
    ///
    /// Messages logged after `close` fall back to standard output.
    pub fn close(&self) -> io::Result<()> {
        let mut inner = self.lock();
        if let Target::File(file) = &mut inner.target {
            file.flush()?;
            inner.target = Target::Stdout;
        }
        Ok(())
    }
}

impl Inner {
    fn apply_redactions(&self, message: &str) -> String {
        let mut result = message.to_string();
        for value in &self.redacted {
            result = result.replace(value, MASK);
        }
        result
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        let target = match inner.target {
            Target::Stdout => "stdout",
            Target::File(_) => "file",
        };
        f.debug_struct("Logger")
            .field("target", &target)
            .field("redactions", &inner.redacted.len())
            .finish()
    }
}
