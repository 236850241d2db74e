// src/exec/sink.rs

//! Destinations for complete output lines.
//!
//! Exactly one sink exists per monitored stream per invocation. The sink is
//! chosen when a command is run, not when it is constructed: a redirection
//! file if the caller gave one, the shared [`Logger`] otherwise.

use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::errors::Result;
use crate::logger::Logger;

/// Anything that accepts one complete line of child output at a time.
///
/// Lines are passed without their trailing newline; the sink decides how to
/// terminate them.
#[allow(async_fn_in_trait)]
pub trait LineSink {
    /// Accepts one line, in stream order.
    async fn write_line(&mut self, line: &[u8]) -> Result<()>;

    /// Pushes any buffered data through to the underlying destination.
    async fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Runtime-selected sink for one stream of one invocation.
pub enum OutputSink {
    /// An already-open file; each line is written followed by a newline.
    Stream(File),
    /// The shared logger's informational channel.
    Log(Logger),
}

impl OutputSink {
    pub fn stream(file: File) -> Self {
        Self::Stream(file)
    }

    pub fn log(logger: Logger) -> Self {
        Self::Log(logger)
    }
}

impl LineSink for OutputSink {
    async fn write_line(&mut self, line: &[u8]) -> Result<()> {
        match self {
            Self::Stream(file) => {
                file.write_all(line).await?;
                file.write_all(b"\n").await?;
                Ok(())
            }
            Self::Log(logger) => {
                logger.info(&String::from_utf8_lossy(line))?;
                Ok(())
            }
        }
    }

    async fn flush(&mut self) -> Result<()> {
        // The logger flushes per line; files buffer until told otherwise.
        if let Self::Stream(file) = self {
            file.flush().await?;
        }
        Ok(())
    }
}
