// src/exec/runner.rs

//! Supervises a single task's external process.
//!
//! The runner builds the child's environment, launches it, drains stdout and
//! stderr concurrently until both reach end-of-stream, times the run and
//! classifies the exit. A nonzero exit is an [`Outcome`], not an error; only
//! failures to write the run log come back as `Err`.

use std::io::Write;
use std::process::Stdio;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Local;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::dag::Task;
use crate::exec::env::build_environment;
use crate::exec::log::RunLog;

/// How a task's process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Exit code 0.
    Success { elapsed: Duration },
    /// The process ran and exited nonzero. `exit_code` is `None` when it was
    /// terminated by a signal.
    Failure {
        exit_code: Option<i32>,
        elapsed: Duration,
    },
    /// The process could not be started at all.
    LaunchFailure { reason: String },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }
}

/// Format a wall-clock duration for the run log.
///
/// Runs of at least a minute are reported in minutes and seconds.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs >= 60 {
        format!("{} minutes, and {} seconds", secs / 60, secs % 60)
    } else {
        format!("{secs} seconds")
    }
}

fn timestamp() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S%.3f").to_string()
}

/// Runs tasks as real OS processes.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    /// Echo the child's stdout to the console. When off, stdout is still
    /// drained but only traced at debug level.
    echo_stdout: bool,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self { echo_stdout: true }
    }
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runner that does not echo child stdout to the console.
    pub fn quiet() -> Self {
        Self { echo_stdout: false }
    }

    /// Run `task` to completion, recording into `log`.
    pub async fn execute(&self, task: &Task, log: &RunLog) -> Result<Outcome> {
        log.begin_entry(&format!("Running {}: {}", task.name, task.display_command()))
            .await?;

        let Some(program) = task.program() else {
            let reason = "empty command line".to_string();
            log.append_line(&format!("The task {} could not be launched: {reason}", task.name))
                .await?;
            return Ok(Outcome::LaunchFailure { reason });
        };

        let env = build_environment(std::env::vars(), &task.env);

        let mut cmd = Command::new(program);
        cmd.args(task.args())
            .env_clear()
            .envs(&env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let started = Instant::now();
        info!(task = %task.name, cmd = %task.display_command(), "starting task process");

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                let reason = e.to_string();
                warn!(task = %task.name, error = %reason, "could not launch task process");
                log.append_line(&format!(
                    "The task {} could not be launched at {}: {reason}",
                    task.name,
                    timestamp()
                ))
                .await?;
                return Ok(Outcome::LaunchFailure { reason });
            }
        };

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        // Both pipes are drained while waiting so neither OS buffer can fill
        // and stall the child; all three must finish before we go on.
        let (status, stdout_lines, stderr_lines) = tokio::join!(
            child.wait(),
            drain_stdout(stdout, &task.name, self.echo_stdout.then(std::io::stdout)),
            drain_stderr(stderr, log),
        );

        let elapsed = started.elapsed();
        let stderr_lines = stderr_lines?;
        let status = status.with_context(|| format!("waiting for process of task '{}'", task.name))?;

        debug!(
            task = %task.name,
            stdout_lines,
            stderr_lines,
            "output streams drained"
        );

        if status.success() {
            let summary = format!(
                "Runtime of task {} was: {}.",
                task.name,
                format_elapsed(elapsed)
            );
            info!(task = %task.name, elapsed_ms = elapsed.as_millis() as u64, "task process exited");
            log.append_line(&summary).await?;
            return Ok(Outcome::Success { elapsed });
        }

        let exit_code = status.code();
        let fail = format!(
            "The task {} failed in execution at {}. Check the log above for details.",
            task.name,
            timestamp()
        );
        warn!(
            task = %task.name,
            exit_code = ?exit_code,
            elapsed_ms = elapsed.as_millis() as u64,
            "task process failed"
        );

        // Best effort teardown of anything left behind by the child.
        if let Err(e) = child.start_kill() {
            debug!(task = %task.name, error = %e, "teardown after failure was a no-op");
        }

        log.append_line(&fail).await?;
        Ok(Outcome::Failure { exit_code, elapsed })
    }
}

/// Read `reader` line by line until end-of-stream, calling `on_line` with
/// each line (lossily decoded, without the trailing newline).
async fn for_each_line<R, F, Fut>(reader: R, mut on_line: F) -> Result<usize>
where
    R: AsyncRead + Unpin,
    F: FnMut(String) -> Fut,
    Fut: std::future::Future<Output = Result<()>>,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let mut count = 0;

    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .await
            .context("reading child output")?;
        if n == 0 {
            break;
        }
        if buf.ends_with(b"\n") {
            buf.pop();
            if buf.ends_with(b"\r") {
                buf.pop();
            }
        }
        on_line(String::from_utf8_lossy(&buf).into_owned()).await?;
        count += 1;
    }

    Ok(count)
}

/// Drain a child's stdout, echoing each line to `echo` when given. A write
/// error on the console (for example a closed pipe) stops the echo; the
/// stream is still drained to the end.
async fn drain_stdout<R, W>(stdout: Option<R>, task: &str, mut echo: Option<W>) -> usize
where
    R: AsyncRead + Unpin,
    W: Write,
{
    let Some(stdout) = stdout else {
        return 0;
    };

    let res = for_each_line(stdout, |line| {
        let failed = match echo.as_mut() {
            Some(out) => writeln!(out, "{line}").and_then(|_| out.flush()).err(),
            None => {
                debug!(task = %task, "stdout: {}", line);
                None
            }
        };
        if let Some(e) = failed {
            warn!(task = %task, error = %e, "console not writable; no longer echoing task stdout");
            echo = None;
        }
        std::future::ready(Ok(()))
    })
    .await;

    match res {
        Ok(n) => n,
        Err(e) => {
            warn!(task = %task, error = %e, "stopped reading task stdout");
            0
        }
    }
}

async fn drain_stderr<R>(stderr: Option<R>, log: &RunLog) -> Result<usize>
where
    R: AsyncRead + Unpin,
{
    let Some(stderr) = stderr else {
        return Ok(0);
    };
    for_each_line(stderr, |line| async move { log.append_stderr_line(&line).await }).await
}
