use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

use crate::error::{AppError, Result};

/// Build the base agent command: piped stdout/stderr, killed if dropped.
pub fn agent_command(binary: &Path, leading_args: &[String], cwd: &Path) -> Command {
    let mut cmd = Command::new(binary);
    cmd.args(leading_args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        // Allow running from inside another Claude Code session
        .env_remove("CLAUDECODE")
        .env_remove("CLAUDE_CODE");
    cmd
}

pub fn spawn(cmd: &mut Command, binary: &Path) -> Result<Child> {
    cmd.spawn()
        .map_err(|e| AppError::SpawnFailure(format!("{}: {e}", binary.display())))
}

/// Read a pipe to the end on a separate task so the child never blocks on it.
pub fn drain<R>(pipe: Option<R>) -> JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = String::new();
        if let Some(mut pipe) = pipe {
            if let Err(e) = pipe.read_to_string(&mut buf).await {
                tracing::debug!(error = %e, "Failed to drain agent pipe");
            }
        }
        buf
    })
}

/// Kill the child after a timeout and reap it.
pub async fn terminate(child: &mut Child, timeout: Duration) -> AppError {
    tracing::warn!(timeout_secs = timeout.as_secs(), "Agent timed out, killing process");
    if let Err(e) = child.kill().await {
        tracing::warn!(error = %e, "Failed to kill agent process");
    }
    AppError::Timeout {
        secs: timeout.as_secs(),
    }
}

/// Error for a non-zero exit that left nothing usable behind.
pub fn exit_failure(status: ExitStatus, stderr: String) -> AppError {
    AppError::AgentExited {
        code: status.code(),
        stderr: stderr.trim().to_string(),
    }
}
