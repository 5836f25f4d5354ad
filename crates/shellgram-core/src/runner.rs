//! Subprocess execution for resolved command lines.
//!
//! [`TaskRunner::spawn`] registers the task, then detaches a tokio task that
//! runs the subprocess, honours the task's cancellation token, replies to
//! the originating chat and deregisters the entry on every exit path.
//!
//! Only standard output is captured. Standard error goes to `/dev/null`, so
//! a command that only reports failures on stderr surfaces as a bare exit
//! status.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use shellgram_channels::Channel;
use shellgram_types::event::InboundMessage;

use crate::context::send_logged;
use crate::registry::{TaskGuard, TaskId, TaskRegistry};
use crate::resolver::CommandLine;

/// Why a task did not produce output.
#[derive(Error, Debug)]
pub enum TaskError {
    /// The command line has no program name (e.g. it starts with a space).
    #[error("empty command")]
    EmptyCommand,

    /// The executable could not be started.
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The process ran and exited non-zero.
    #[error("exit status {0}")]
    ExitStatus(i32),

    /// The process was terminated by a signal it did not ask for.
    #[error("terminated by signal {0}")]
    Signal(i32),

    /// The task was cancelled via `/kill`.
    #[error("killed")]
    Cancelled,

    /// Waiting on the process or reading its output failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl TaskError {
    fn from_status(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return TaskError::ExitStatus(code);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return TaskError::Signal(signal);
            }
        }
        TaskError::ExitStatus(-1)
    }
}

/// Spawns and supervises task subprocesses.
#[derive(Clone)]
pub struct TaskRunner {
    registry: Arc<TaskRegistry>,
    channel: Arc<dyn Channel>,
}

impl TaskRunner {
    pub fn new(registry: Arc<TaskRegistry>, channel: Arc<dyn Channel>) -> Self {
        Self { registry, channel }
    }

    /// Start `command` in `working_dir` without waiting for it.
    ///
    /// The registry entry exists before this returns, so a `/tasks` or
    /// `/kill` processed right after sees it. Callers normally drop the
    /// returned handle: the handler's contract is "accepted", not "done".
    pub fn spawn(
        &self,
        command: CommandLine,
        working_dir: PathBuf,
        origin: InboundMessage,
    ) -> (TaskId, JoinHandle<()>) {
        let cancel = CancellationToken::new();
        let guard = self.registry.register_guarded(command.as_str(), cancel.clone());
        let id = guard.id();
        let channel = Arc::clone(&self.channel);

        let handle = tokio::spawn(async move {
            run_registered(guard, &command, &working_dir, cancel, &*channel, &origin).await;
        });
        (id, handle)
    }
}

async fn run_registered(
    guard: TaskGuard,
    command: &CommandLine,
    working_dir: &Path,
    cancel: CancellationToken,
    channel: &dyn Channel,
    origin: &InboundMessage,
) {
    let id = guard.id();
    info!(
        task_id = %id,
        command = command.as_str(),
        dir = %working_dir.display(),
        "executing"
    );

    let result = execute(command, working_dir, &cancel).await;
    // Entry goes away before the reply so a racing `/tasks` never lists a
    // finished task.
    drop(guard);

    match result {
        Ok(output) if output.is_empty() => {
            debug!(task_id = %id, "task finished with empty output");
        }
        Ok(output) => {
            info!(task_id = %id, bytes = output.len(), "task finished");
            send_logged(channel, &origin.reply(output)).await;
        }
        Err(e) => {
            warn!(task_id = %id, error = %e, "task failed");
            send_logged(channel, &origin.reply(e.to_string())).await;
        }
    }
}

/// Run `command` to completion and return its standard output.
///
/// Cancelling `cancel` kills the process and yields [`TaskError::Cancelled`].
pub async fn execute(
    command: &CommandLine,
    working_dir: &Path,
    cancel: &CancellationToken,
) -> Result<String, TaskError> {
    let program = command.program();
    if program.is_empty() {
        return Err(TaskError::EmptyCommand);
    }

    let mut child = Command::new(program)
        .args(command.args())
        .current_dir(working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| TaskError::Spawn {
            program: program.to_owned(),
            source,
        })?;

    // Drain stdout concurrently so a chatty process never blocks on a
    // full pipe while we wait on it.
    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| std::io::Error::other("stdout was not captured"))?;
    let mut reader = tokio::spawn(async move {
        let mut buf = Vec::new();
        stdout.read_to_end(&mut buf).await.map(|_| buf)
    });

    let status = tokio::select! {
        status = child.wait() => status?,
        _ = cancel.cancelled() => {
            reader.abort();
            if let Err(e) = child.kill().await {
                warn!(error = %e, "failed to kill cancelled process");
            }
            return Err(TaskError::Cancelled);
        }
    };

    // A background grandchild may still hold the pipe open.
    let bytes = tokio::select! {
        joined = &mut reader => joined
            .map_err(|e| std::io::Error::other(e.to_string()))??,
        _ = cancel.cancelled() => {
            reader.abort();
            return Err(TaskError::Cancelled);
        }
    };

    if !status.success() {
        return Err(TaskError::from_status(status));
    }

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
