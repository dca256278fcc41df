//! Runs the watched command and reports its outcome.

use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command as ProcessCommand;

use crate::config::Command;
use crate::error::CommandError;

/// Outcome of one run. A failed run is an ordinary result, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    /// Whether the command exited successfully.
    pub success: bool,
    /// Combined stdout and stderr, in arrival order.
    pub output: String,
    /// Why the run failed, if it did.
    pub error: Option<CommandError>,
    /// Wall time from spawn to exit.
    pub elapsed: Duration,
}

impl RunResult {
    fn finished(output: &[u8], error: Option<CommandError>, started: Instant) -> Self {
        Self {
            success: error.is_none(),
            output: String::from_utf8_lossy(output).into_owned(),
            error,
            elapsed: started.elapsed(),
        }
    }
}

/// A finished run plus the exact bytes it printed.
struct Execution {
    raw: Vec<u8>,
    result: RunResult,
}

impl Execution {
    fn finished(raw: Vec<u8>, error: Option<CommandError>, started: Instant) -> Self {
        let result = RunResult::finished(&raw, error, started);
        Self { raw, result }
    }
}

/// Capability used by the dispatch loop to execute the command.
pub trait CommandRunner: Send {
    /// Run `command` to completion.
    fn run(&mut self, command: &Command) -> impl Future<Output = RunResult> + Send;
}

/// Runs commands as child processes and forwards their output to a sink.
#[derive(Debug)]
pub struct ProcessRunner<W> {
    sink: W,
    current_dir: Option<PathBuf>,
}

impl ProcessRunner<std::io::Stdout> {
    /// Runner that forwards command output to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> ProcessRunner<W> {
    /// Create a runner writing captured output to `sink`.
    pub const fn new(sink: W) -> Self {
        Self {
            sink,
            current_dir: None,
        }
    }

    /// Run commands in `dir` instead of the current working directory.
    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// The output sink.
    pub const fn sink(&self) -> &W {
        &self.sink
    }

    fn report(&mut self, command: &Command, raw: &[u8], result: &RunResult) {
        if let Err(e) = self
            .sink
            .write_all(raw)
            .and_then(|()| self.sink.flush())
        {
            tracing::warn!(error = %e, "Failed to forward command output");
        }

        match &result.error {
            None => tracing::info!(
                command = %command,
                elapsed_ms = result.elapsed.as_millis(),
                "Run complete"
            ),
            Some(error) => tracing::error!(
                command = %command,
                elapsed_ms = result.elapsed.as_millis(),
                %error,
                "Run failed"
            ),
        }
    }
}

impl<W: Write + Send> CommandRunner for ProcessRunner<W> {
    async fn run(&mut self, command: &Command) -> RunResult {
        tracing::info!(command = %command, "Running command");
        let Execution { raw, result } = execute(command, self.current_dir.as_deref()).await;
        self.report(command, &raw, &result);
        result
    }
}

/// Spawn `command` and wait for it, capturing combined output.
async fn execute(command: &Command, current_dir: Option<&Path>) -> Execution {
    let started = Instant::now();
    let mut process = ProcessCommand::new(command.program());
    process
        .args(command.args())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = current_dir {
        process.current_dir(dir);
    }

    let mut child = match process.spawn() {
        Ok(child) => child,
        Err(e) => {
            let error = CommandError::Spawn {
                program: command.program().to_string(),
                reason: e.to_string(),
            };
            return Execution::finished(Vec::new(), Some(error), started);
        }
    };

    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        let error = CommandError::Capture("child pipes unavailable".to_string());
        return Execution::finished(Vec::new(), Some(error), started);
    };

    let output = match read_combined(stdout, stderr).await {
        Ok(output) => output,
        Err(e) => {
            return Execution::finished(
                Vec::new(),
                Some(CommandError::Capture(e.to_string())),
                started,
            )
        }
    };

    let error = match child.wait().await {
        Ok(status) if status.success() => None,
        Ok(status) => Some(CommandError::Failed(status.to_string())),
        Err(e) => Some(CommandError::Capture(e.to_string())),
    };

    Execution::finished(output, error, started)
}

/// Read both pipes until EOF, interleaving chunks as they arrive.
async fn read_combined<A, B>(mut stdout: A, mut stderr: B) -> std::io::Result<Vec<u8>>
where
    A: AsyncRead + Unpin,
    B: AsyncRead + Unpin,
{
    let mut combined = Vec::new();
    let mut out_buf = [0u8; 4096];
    let mut err_buf = [0u8; 4096];
    let (mut out_open, mut err_open) = (true, true);

    while out_open || err_open {
        tokio::select! {
            n = stdout.read(&mut out_buf), if out_open => match n? {
                0 => out_open = false,
                n => combined.extend_from_slice(&out_buf[..n]),
            },
            n = stderr.read(&mut err_buf), if err_open => match n? {
                0 => err_open = false,
                n => combined.extend_from_slice(&err_buf[..n]),
            },
        }
    }

    Ok(combined)
}
