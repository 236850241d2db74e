// src/exec/mod.rs

//! Process execution core.
//!
//! This module runs external child processes (build tools, test runners)
//! and streams their output back line by line while the parent stays
//! responsive:
//!
//! - [`line_buffer`] reassembles newline-delimited lines from the raw,
//!   arbitrarily-chunked bytes read off a pipe.
//! - [`sink`] defines where complete lines go: a redirection file or the
//!   shared logger.
//! - [`command`] owns the invocation itself: spawn with piped stdout and
//!   stderr, multiplex reads against process exit, drain, reap, flush.

pub mod command;
pub mod line_buffer;
pub mod sink;

pub use command::{Command, Redirections};
pub use line_buffer::LineBuffer;
pub use sink::{LineSink, OutputSink};
