//! External tool runner: spawn a shell command, stream its stdout, wait for exit

use crate::error::{ReconError, Result};
use std::collections::VecDeque;
use std::process::Stdio;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::Command;

/// Number of trailing stderr lines kept for failure diagnostics
const STDERR_TAIL: usize = 5;

/// What to keep from a tool's standard output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    /// Only count lines
    Count,
    /// Count lines and keep them, lower-cased
    Lowercase,
}

/// A command line to run through the shell
#[derive(Debug, Clone)]
pub struct Invocation {
    pub tool: String,
    pub command_line: String,
}

impl Invocation {
    pub fn new(tool: impl Into<String>, command_line: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            command_line: command_line.into(),
        }
    }
}

/// Output of a finished tool
#[derive(Debug, Default)]
pub struct ToolOutput {
    pub lines: usize,
    pub captured: Vec<String>,
}

/// Runs tool invocations as `<shell> -c <command line>`
#[derive(Debug, Clone)]
pub struct ToolRunner {
    shell: String,
}

impl Default for ToolRunner {
    fn default() -> Self {
        Self::new("bash")
    }
}

impl ToolRunner {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }

    /// Run `invocation` to completion.
    ///
    /// Stdout and stderr are drained by their own tasks while this future waits on the
    /// child, so a chatty tool never blocks on a full pipe. `on_first_line` fires once,
    /// when the first stdout line arrives. A non-zero exit is returned as
    /// [`ReconError::ToolFailed`].
    pub async fn run<F>(
        &self,
        invocation: &Invocation,
        capture: Capture,
        on_first_line: F,
    ) -> Result<ToolOutput>
    where
        F: FnOnce() + Send + 'static,
    {
        tracing::debug!(tool = %invocation.tool, command = %invocation.command_line, "spawning");

        let mut child = Command::new(&self.shell)
            .arg("-c")
            .arg(&invocation.command_line)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ReconError::Spawn {
                tool: invocation.tool.clone(),
                source,
            })?;

        let stdout = child.stdout.take().ok_or_else(|| ReconError::Spawn {
            tool: invocation.tool.clone(),
            source: std::io::Error::other("stdout was not captured"),
        })?;
        let stderr = child.stderr.take().ok_or_else(|| ReconError::Spawn {
            tool: invocation.tool.clone(),
            source: std::io::Error::other("stderr was not captured"),
        })?;

        let stdout_task = tokio::spawn(drain_lines(BufReader::new(stdout), capture, on_first_line));
        let stderr_task = tokio::spawn(tail_lines(BufReader::new(stderr), STDERR_TAIL));

        let status = child.wait().await?;
        let output = stdout_task.await??;
        let stderr_tail = stderr_task.await??;

        tracing::debug!(tool = %invocation.tool, %status, lines = output.lines, "finished");

        if !status.success() {
            return Err(ReconError::ToolFailed {
                tool: invocation.tool.clone(),
                status: status.to_string(),
                stderr: stderr_tail,
            });
        }

        Ok(output)
    }
}

/// Read every line from `reader`, counting and optionally keeping them
async fn drain_lines<R, F>(mut reader: R, capture: Capture, on_first_line: F) -> std::io::Result<ToolOutput>
where
    R: AsyncBufRead + Unpin,
    F: FnOnce(),
{
    let mut output = ToolOutput::default();
    let mut on_first_line = Some(on_first_line);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }

        output.lines += 1;
        if let Some(notify) = on_first_line.take() {
            notify();
        }

        if capture == Capture::Lowercase {
            let line = String::from_utf8_lossy(&buf);
            let line = line.trim_end_matches(['\n', '\r']);
            output.captured.push(line.to_lowercase());
        }
    }

    Ok(output)
}

/// Keep only the last `keep` non-empty lines of `reader`
async fn tail_lines<R>(reader: R, keep: usize) -> std::io::Result<Vec<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut tail = VecDeque::with_capacity(keep);

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        if tail.len() == keep {
            tail.pop_front();
        }
        tail.push_back(line);
    }

    Ok(tail.into())
}

/// Quote `value` for safe interpolation into a POSIX shell command line
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
