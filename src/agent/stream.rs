use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::agent::event::{classify_line, AgentEvent};
use crate::agent::process;
use crate::agent::reader::{AgentRequest, EventStreamReader};
use crate::error::{AppError, Result};

/// Runs `claude -p --output-format stream-json` and classifies each line as
/// soon as it is read.
pub struct StreamingReader {
    binary: PathBuf,
    args: Vec<String>,
    permission_mode: Option<String>,
}

impl StreamingReader {
    pub fn new(binary: PathBuf) -> Self {
        Self {
            binary,
            args: Vec::new(),
            permission_mode: None,
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_permission_mode(mut self, mode: Option<String>) -> Self {
        self.permission_mode = mode;
        self
    }
}

/// Best-effort copy of raw lines to a transcript file.
fn open_tee(path: Option<&Path>) -> Option<std::io::BufWriter<std::fs::File>> {
    let path = path?;
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
    {
        Ok(file) => Some(std::io::BufWriter::new(file)),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Cannot open transcript file");
            None
        }
    }
}

#[async_trait]
impl EventStreamReader for StreamingReader {
    async fn read_events(&self, request: &AgentRequest) -> Result<Vec<AgentEvent>> {
        let mut cmd = process::agent_command(&self.binary, &self.args, &request.cwd);
        cmd.arg("-p")
            .arg(&request.prompt)
            .arg("--output-format")
            .arg("stream-json")
            .arg("--verbose")
            .arg("--max-turns")
            .arg(request.max_turns.to_string());
        if let Some(mode) = &self.permission_mode {
            cmd.arg("--permission-mode").arg(mode);
        }

        let mut child = process::spawn(&mut cmd, &self.binary)?;
        tracing::info!(
            binary = %self.binary.display(),
            max_turns = request.max_turns,
            "Agent started (stream mode)"
        );

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AppError::SpawnFailure("failed to capture stdout".to_string()))?;
        let stderr = process::drain(child.stderr.take());

        // Raw segments: a line that is not UTF-8 must not end the stream
        let mut lines = BufReader::new(stdout).split(b'\n');
        let mut tee = open_tee(request.transcript.as_deref());
        let mut events = Vec::new();

        let read = async {
            while let Some(segment) = lines.next_segment().await? {
                if let Some(w) = tee.as_mut() {
                    let _ = w.write_all(&segment).and_then(|()| w.write_all(b"\n"));
                }

                let line = String::from_utf8_lossy(&segment);
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }

                let event = classify_line(trimmed);
                tracing::debug!(kind = event.kind(), index = events.len(), "Agent event");
                events.push(event);
            }
            Ok::<_, AppError>(child.wait().await?)
        };
        let waited = tokio::time::timeout(request.timeout, read).await;

        let status = match waited {
            Ok(status) => status?,
            Err(_) => {
                let err = process::terminate(&mut child, request.timeout).await;
                stderr.abort();
                return Err(err);
            }
        };

        if let Some(mut w) = tee {
            let _ = w.flush();
        }

        let stderr = stderr.await.unwrap_or_default();
        if !status.success() {
            if !events.iter().any(AgentEvent::is_usable) {
                return Err(process::exit_failure(status, stderr));
            }
            tracing::warn!(
                code = ?status.code(),
                stderr = %stderr.trim(),
                "Agent exited with failure status after producing events"
            );
        }

        tracing::info!(events = events.len(), "Agent stream finished");
        Ok(events)
    }
}
