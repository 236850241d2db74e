// src/exec/line_buffer.rs

//! Incremental reassembly of newline-delimited lines from raw byte chunks.

use super::sink::LineSink;
use crate::errors::Result;

/// Accumulates the chunks read from one pipe and emits complete lines to
/// its sink, holding the trailing partial line across calls.
///
/// One `LineBuffer` is created per stream per invocation and lives until
/// [`flush`](LineBuffer::flush) at end-of-stream. The pending fragment
/// never contains a newline: everything up to the last newline seen has
/// already been emitted.
pub struct LineBuffer<S> {
    sink: S,
    pending: Vec<u8>,
}

impl<S: LineSink> LineBuffer<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            pending: Vec::new(),
        }
    }

    /// Processes one chunk. Every newline in it completes a line (joined
    /// with the pending fragment, which may be empty) that is written to
    /// the sink immediately; bytes after the last newline are retained for
    /// the next call. Empty chunks are a no-op.
    pub async fn feed(&mut self, chunk: &[u8]) -> Result<()> {
        let mut rest = chunk;
        while let Some(pos) = rest.iter().position(|&b| b == b'\n') {
            let (head, tail) = rest.split_at(pos);
            if self.pending.is_empty() {
                self.sink.write_line(head).await?;
            } else {
                self.pending.extend_from_slice(head);
                let line = std::mem::take(&mut self.pending);
                self.sink.write_line(&line).await?;
            }
            rest = &tail[1..];
        }
        self.pending.extend_from_slice(rest);
        Ok(())
    }

    /// Emits the pending fragment, if any, as a final line; the source
    /// stream ended without terminating it. Calling `flush` again is safe
    /// and emits nothing.
    pub async fn flush(&mut self) -> Result<()> {
        if !self.pending.is_empty() {
            let line = std::mem::take(&mut self.pending);
            self.sink.write_line(&line).await?;
        }
        self.sink.flush().await
    }

    /// The sink this buffer emits to.
    pub fn sink(&self) -> &S {
        &self.sink
    }
}
