//! Supervision of external worker processes.
//!
//! Three racers compete for one [`CompletionGate`]: the stdout reader
//! (output fully drained), the timer (timeout) and either reader on an I/O
//! error. Whatever wins, the child is reaped and both reader tasks are
//! finished before [`ProcessOrchestrator::run`] returns.

use std::collections::BTreeMap;
use std::io;
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::gate::CompletionGate;
use crate::types::Invocation;

/// Executable directories that must be searchable even when the caller's
/// environment is minimal (e.g. launched from a GUI session).
#[cfg(unix)]
const STANDARD_PATHS: &[&str] = &[
    "/usr/local/bin",
    "/opt/homebrew/bin",
    "/usr/bin",
    "/bin",
    "/usr/sbin",
    "/sbin",
];
#[cfg(not(unix))]
const STANDARD_PATHS: &[&str] = &[];

#[cfg(unix)]
const PATH_SEPARATOR: &str = ":";
#[cfg(not(unix))]
const PATH_SEPARATOR: &str = ";";

const STDERR_GRACE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInvocation {
    pub command: String,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub timeout: Duration,
}

impl ProcessInvocation {
    pub fn new(command: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            command: command.into(),
            args: args.into_iter().map(Into::into).collect(),
            env: BTreeMap::new(),
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: Vec<u8>,
    /// Diagnostic context only; empty when the worker wrote nothing.
    pub stderr: String,
    pub status: Option<ExitStatus>,
    pub pid: Option<u32>,
}

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Could not start worker {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("Timed out after {}s waiting for worker {command}", .timeout.as_secs_f64())]
    Timeout {
        command: String,
        timeout: Duration,
        pid: Option<u32>,
        stderr: String,
    },
    #[error("Reading worker output failed: {source}")]
    Io {
        #[source]
        source: io::Error,
        pid: Option<u32>,
        stderr: String,
    },
    #[error("Worker {command} exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: ExitStatus,
        pid: Option<u32>,
        stderr: String,
    },
}

impl ProcessError {
    pub fn stderr(&self) -> &str {
        match self {
            ProcessError::Spawn { .. } => "",
            ProcessError::Timeout { stderr, .. }
            | ProcessError::Io { stderr, .. }
            | ProcessError::Failed { stderr, .. } => stderr,
        }
    }

    pub fn pid(&self) -> Option<u32> {
        match self {
            ProcessError::Spawn { .. } => None,
            ProcessError::Timeout { pid, .. }
            | ProcessError::Io { pid, .. }
            | ProcessError::Failed { pid, .. } => *pid,
        }
    }
}

enum Outcome {
    Drained(Vec<u8>),
    TimedOut,
    Failed(io::Error),
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessOrchestrator;

impl ProcessOrchestrator {
    pub async fn run(
        &self,
        job: &ProcessInvocation,
        invocation: Invocation<'_>,
    ) -> Result<ProcessOutput, ProcessError> {
        let deadline = Instant::now() + job.timeout;
        let mut child = build_command(job)
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                command: job.command.clone(),
                source,
            })?;
        let pid = child.id();
        invocation.debug(format!(
            "spawned {} (pid {pid:?}, timeout {:?})",
            job.command, job.timeout
        ));

        let (gate, outcome_rx) = CompletionGate::new();
        let stderr_buf = Arc::new(Mutex::new(Vec::new()));

        let stdout_task = child.stdout.take().map(|stdout| {
            let gate = gate.clone();
            tokio::spawn(async move {
                match drain(stdout).await {
                    Ok(bytes) => gate.resolve(Outcome::Drained(bytes)),
                    Err(err) => gate.resolve(Outcome::Failed(err)),
                };
            })
        });
        let stderr_task = child.stderr.take().map(|stderr| {
            let gate = gate.clone();
            let buf = stderr_buf.clone();
            tokio::spawn(async move {
                if let Err(err) = collect_into(stderr, &buf).await {
                    gate.resolve(Outcome::Failed(err));
                }
            })
        });
        let timer_task = {
            let gate = gate.clone();
            tokio::spawn(async move {
                tokio::time::sleep_until(deadline).await;
                gate.resolve(Outcome::TimedOut);
            })
        };
        if stdout_task.is_none() {
            gate.resolve(Outcome::Failed(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "worker stdout was not captured",
            )));
        }

        let outcome = outcome_rx.await.unwrap_or_else(|_| {
            Outcome::Failed(io::Error::other("completion gate closed"))
        });
        timer_task.abort();

        let result = match outcome {
            Outcome::Drained(stdout) => {
                let status = reap_before(&mut child, deadline).await;
                finish(stdout_task, Some(STDERR_GRACE)).await;
                finish(stderr_task, Some(STDERR_GRACE)).await;
                let stderr = take_text(&stderr_buf);
                match status {
                    Some(status) if !status.success() && is_blank(&stdout) => {
                        Err(ProcessError::Failed {
                            command: job.command.clone(),
                            status,
                            pid,
                            stderr,
                        })
                    }
                    _ => Ok(ProcessOutput {
                        stdout,
                        stderr,
                        status,
                        pid,
                    }),
                }
            }
            Outcome::TimedOut => {
                terminate(&mut child).await;
                finish(stdout_task, None).await;
                finish(stderr_task, None).await;
                Err(ProcessError::Timeout {
                    command: job.command.clone(),
                    timeout: job.timeout,
                    pid,
                    stderr: take_text(&stderr_buf),
                })
            }
            Outcome::Failed(source) => {
                terminate(&mut child).await;
                finish(stdout_task, None).await;
                finish(stderr_task, None).await;
                Err(ProcessError::Io {
                    source,
                    pid,
                    stderr: take_text(&stderr_buf),
                })
            }
        };

        match &result {
            Ok(output) => {
                invocation.debug(format!(
                    "worker pid {pid:?} finished with {:?}, {} stdout bytes",
                    output.status,
                    output.stdout.len()
                ));
                if !output.stderr.trim().is_empty() {
                    invocation.debug(format!("worker stderr: {}", output.stderr.trim()));
                }
            }
            Err(err) => {
                invocation.warn(format!("worker pid {pid:?} failed: {err}"));
                if !err.stderr().trim().is_empty() {
                    invocation.warn(format!("worker stderr: {}", err.stderr().trim()));
                }
            }
        }
        result
    }
}

fn build_command(job: &ProcessInvocation) -> Command {
    let inherited = std::env::var("PATH").ok();
    let base_path = job.env.get("PATH").cloned().or(inherited);

    let mut cmd = Command::new(&job.command);
    cmd.args(&job.args)
        .envs(&job.env)
        .env("PATH", merged_path(base_path.as_deref()))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    cmd
}

/// `current` with every missing standard directory appended.
pub fn merged_path(current: Option<&str>) -> String {
    let mut entries: Vec<&str> = current
        .unwrap_or_default()
        .split(PATH_SEPARATOR)
        .filter(|entry| !entry.is_empty())
        .collect();
    for dir in STANDARD_PATHS.iter().copied() {
        if !entries.contains(&dir) {
            entries.push(dir);
        }
    }
    entries.join(PATH_SEPARATOR)
}

async fn drain<R: AsyncRead + Unpin>(mut reader: R) -> io::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).await?;
    Ok(bytes)
}

async fn collect_into<R: AsyncRead + Unpin>(
    mut reader: R,
    buf: &Mutex<Vec<u8>>,
) -> io::Result<()> {
    let mut chunk = [0u8; 4096];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        if let Ok(mut buf) = buf.lock() {
            buf.extend_from_slice(&chunk[..n]);
        }
    }
}

/// Waits for exit until `deadline`, then kills.
async fn reap_before(child: &mut Child, deadline: Instant) -> Option<ExitStatus> {
    match tokio::time::timeout_at(deadline, child.wait()).await {
        Ok(Ok(status)) => Some(status),
        Ok(Err(_)) => terminate(child).await,
        Err(_) => terminate(child).await,
    }
}

async fn terminate(child: &mut Child) -> Option<ExitStatus> {
    let _ = child.start_kill();
    child.wait().await.ok()
}

/// Lets a reader task end on its own within `grace`, otherwise aborts it.
/// Either way the task, and the pipe it owns, is gone on return.
async fn finish(task: Option<JoinHandle<()>>, grace: Option<Duration>) {
    let Some(mut task) = task else {
        return;
    };
    if let Some(grace) = grace {
        if tokio::time::timeout(grace, &mut task).await.is_ok() {
            return;
        }
    }
    task.abort();
    let _ = task.await;
}

fn take_text(buf: &Mutex<Vec<u8>>) -> String {
    match buf.lock() {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(poisoned) => String::from_utf8_lossy(&poisoned.into_inner()).into_owned(),
    }
}

fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(u8::is_ascii_whitespace)
}
