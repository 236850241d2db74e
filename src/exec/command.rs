// src/exec/command.rs

//! Child process execution with line-streamed output capture.
//!
//! [`Command`] is an immutable description of one external tool: the
//! program, a fixed prefix of leading arguments, and optionally the
//! environment and working directory the child runs with. Each call to
//! [`run`](Command::run), [`check`](Command::check) or
//! [`eval`](Command::eval) appends its own argument suffix and performs one
//! complete invocation: spawn, stream, wait, drain, flush.
//!
//! `run` and `check` stream stdout and stderr line by line, each to its own
//! sink (a redirection file, or the shared [`Logger`] when none is given).
//! `eval` deliberately bypasses the streaming path and captures the whole
//! output at once.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::Context;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::debug;

use super::line_buffer::LineBuffer;
use super::sink::{LineSink, OutputSink};
use crate::errors::{BuildrunError, Result};
use crate::logger::Logger;

/// Scratch buffer size for one pipe read. A read returns whatever is
/// currently available, up to this much, so the loop never waits for a
/// full buffer.
const READ_BUF_SIZE: usize = 8192;

/// Filesystem redirections for one invocation.
///
/// These are paths, not open handles: the files are opened right before
/// the child is spawned (`stdin` read-only, `stdout`/`stderr`
/// create-or-truncate) and closed when the invocation finishes, on every
/// path, error or not.
#[derive(Debug, Clone, Default)]
pub struct Redirections {
    pub stdin: Option<PathBuf>,
    pub stdout: Option<PathBuf>,
    pub stderr: Option<PathBuf>,
}

/// Immutable spec for one external tool, bound to the shared logger.
#[derive(Debug, Clone)]
pub struct Command {
    log: Logger,
    program: String,
    prefix: Vec<String>,
    env: Option<BTreeMap<String, String>>,
    cwd: Option<PathBuf>,
}

impl Command {
    /// Creates a spec for the given program with no fixed arguments,
    /// inheriting this process's environment and working directory.
    pub fn new(log: Logger, program: impl Into<String>) -> Self {
        Self {
            log,
            program: program.into(),
            prefix: Vec::new(),
            env: None,
            cwd: None,
        }
    }

    /// Appends one fixed leading argument, passed before the per-call ones.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.prefix.push(arg.into());
        self
    }

    /// Appends fixed leading arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prefix.extend(args.into_iter().map(Into::into));
        self
    }

    /// Sets the child's environment. The map *replaces* the inherited
    /// environment rather than extending it.
    pub fn env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = Some(env);
        self
    }

    /// Sets the child's working directory.
    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// The complete argument vector for one invocation, for display.
    fn argv(&self, extra: &[String]) -> Vec<String> {
        let mut argv = Vec::with_capacity(1 + self.prefix.len() + extra.len());
        argv.push(self.program.clone());
        argv.extend(self.prefix.iter().cloned());
        argv.extend(extra.iter().cloned());
        argv
    }

    /// A `tokio::process::Command` with the argument vector, environment
    /// and working directory applied.
    fn base(&self, extra: &[String]) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(&self.prefix).args(extra);
        if let Some(env) = &self.env {
            cmd.env_clear().envs(env);
        }
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }
        cmd
    }

    /// Runs the command with the given extra arguments, streaming both
    /// output streams line by line to the logger, and returns the exit
    /// status. A non-zero status is a normal return value here, not an
    /// error; callers decide what it means.
    pub async fn run(&self, extra: &[String]) -> Result<i32> {
        self.run_redirected(extra, &Redirections::default()).await
    }

    /// Like [`run`](Command::run), but with the standard streams
    /// redirected to files where paths are given. Streams without a path
    /// fall back to the logger (stdout/stderr) or are closed (stdin).
    pub async fn run_redirected(
        &self,
        extra: &[String],
        redirect: &Redirections,
    ) -> Result<i32> {
        self.log
            .info(&format!("Running command {:?}", self.argv(extra)))?;

        let stdin = match &redirect.stdin {
            Some(path) => {
                let file = std::fs::File::open(path)
                    .with_context(|| format!("opening stdin file '{}'", path.display()))?;
                Stdio::from(file)
            }
            None => Stdio::null(),
        };
        let stdout = self.open_sink(redirect.stdout.as_deref()).await?;
        let stderr = self.open_sink(redirect.stderr.as_deref()).await?;

        self.pump(extra, stdin, stdout, stderr).await
    }

    async fn open_sink(&self, path: Option<&Path>) -> Result<OutputSink> {
        match path {
            Some(path) => {
                let file = tokio::fs::File::create(path)
                    .await
                    .with_context(|| format!("opening output file '{}'", path.display()))?;
                Ok(OutputSink::stream(file))
            }
            None => Ok(OutputSink::log(self.log.clone())),
        }
    }

    /// Spawns the child and drives the multiplexed capture loop until it
    /// exits, then drains and flushes both streams.
    async fn pump(
        &self,
        extra: &[String],
        stdin: Stdio,
        stdout_sink: OutputSink,
        stderr_sink: OutputSink,
    ) -> Result<i32> {
        let mut cmd = self.base(extra);
        cmd.stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning process '{}'", self.program))?;
        debug!(program = %self.program, pid = ?child.id(), "child process started");

        // Both pipes exist because of Stdio::piped above.
        let mut stdout = child.stdout.take().context("child stdout pipe missing")?;
        let mut stderr = child.stderr.take().context("child stderr pipe missing")?;

        let mut out_lines = LineBuffer::new(stdout_sink);
        let mut err_lines = LineBuffer::new(stderr_sink);
        let mut out_chunk = vec![0u8; READ_BUF_SIZE];
        let mut err_chunk = vec![0u8; READ_BUF_SIZE];
        let mut out_open = true;
        let mut err_open = true;

        // Multiplex the two read ends against process exit. All three
        // futures are cancel-safe, so losing a `select!` race never loses
        // data: unread bytes stay in the pipe for the next iteration.
        let status = loop {
            tokio::select! {
                read = stdout.read(&mut out_chunk), if out_open => {
                    let n = read.context("reading child stdout")?;
                    if n == 0 {
                        out_open = false;
                    } else {
                        out_lines.feed(&out_chunk[..n]).await?;
                    }
                }
                read = stderr.read(&mut err_chunk), if err_open => {
                    let n = read.context("reading child stderr")?;
                    if n == 0 {
                        err_open = false;
                    } else {
                        err_lines.feed(&err_chunk[..n]).await?;
                    }
                }
                status = child.wait() => {
                    break status.context("waiting for child process")?;
                }
            }
        };

        // The child may have written between our last read and its exit.
        // Its write ends are closed now, so one drain to end-of-stream per
        // pipe picks up everything that is left.
        if out_open {
            drain(&mut stdout, &mut out_lines, &mut out_chunk)
                .await
                .context("draining child stdout")?;
        }
        if err_open {
            drain(&mut stderr, &mut err_lines, &mut err_chunk)
                .await
                .context("draining child stderr")?;
        }

        // Flush after the drain: only now can a trailing partial line be
        // known to be complete.
        out_lines.flush().await?;
        err_lines.flush().await?;

        let code = status.code().unwrap_or(-1);
        debug!(program = %self.program, exit_code = code, "child process exited");
        Ok(code)
    }

    /// Runs the command and promotes a non-zero exit status to
    /// [`BuildrunError::CommandFailed`].
    pub async fn check(&self, extra: &[String]) -> Result<()> {
        self.check_redirected(extra, &Redirections::default()).await
    }

    /// Like [`check`](Command::check), with file redirections.
    pub async fn check_redirected(
        &self,
        extra: &[String],
        redirect: &Redirections,
    ) -> Result<()> {
        let status = self.run_redirected(extra, redirect).await?;
        if status != 0 {
            return Err(BuildrunError::CommandFailed { status });
        }
        Ok(())
    }

    /// Runs the command with both output streams captured wholesale and
    /// returns the standard output decoded as UTF-8 once the command is
    /// done. Unlike [`run`](Command::run), a non-zero exit is an error
    /// here, carrying the full command line.
    pub async fn eval(&self, extra: &[String]) -> Result<String> {
        let command = self.argv(extra).join(" ");
        self.log.info(&format!("Evaluating command '{command}'"))?;

        let output = self
            .base(extra)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("spawning process '{}'", self.program))?;

        if !output.status.success() {
            let status = output.status.code().unwrap_or(-1);
            return Err(BuildrunError::EvalFailed { command, status });
        }
        let text = String::from_utf8(output.stdout)
            .with_context(|| format!("decoding output of '{command}'"))?;
        Ok(text)
    }
}

/// Reads a pipe to end-of-stream, feeding every chunk to its line buffer.
async fn drain<R, S>(
    reader: &mut R,
    lines: &mut LineBuffer<S>,
    chunk: &mut [u8],
) -> Result<()>
where
    R: AsyncRead + Unpin,
    S: LineSink,
{
    loop {
        let n = reader.read(chunk).await?;
        if n == 0 {
            return Ok(());
        }
        lines.feed(&chunk[..n]).await?;
    }
}
