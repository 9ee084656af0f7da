use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::AsyncReadExt;

use crate::agent::event::{result_event, AgentEvent};
use crate::agent::process;
use crate::agent::reader::{AgentRequest, EventStreamReader};
use crate::error::{AppError, Result};

/// Runs `claude -p --output-format json` and reads one document at exit.
pub struct BatchReader {
    binary: PathBuf,
    args: Vec<String>,
    permission_mode: Option<String>,
}

impl BatchReader {
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

/// The batch document is a result when it says so, or, lacking a `type`,
/// when it carries `is_error` or `subtype`. Anything else (an error envelope,
/// `{}`) is not a verdict.
fn is_result_document(doc: &Value) -> bool {
    match doc.get("type").and_then(Value::as_str) {
        Some(kind) => kind == "result",
        None => doc.get("is_error").is_some() || doc.get("subtype").is_some(),
    }
}

fn batch_subtype(doc: &Value) -> String {
    // A non-boolean `is_error` is treated as an error
    let is_error = match doc.get("is_error") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(_) => true,
    };
    let subtype = match doc.get("subtype") {
        None | Some(Value::Null) => None,
        Some(Value::String(subtype)) => Some(subtype.clone()),
        Some(_) => Some(String::new()),
    };
    match (is_error, subtype) {
        (false, Some(subtype)) => subtype,
        (false, None) => "success".to_string(),
        (true, Some(subtype)) if subtype != "success" && !subtype.is_empty() => subtype,
        (true, _) => "error".to_string(),
    }
}

/// Turn batch stdout into events: one `Result`, one `Unknown` carrying the
/// raw text if it is not a result document, or nothing for empty output.
pub fn parse_batch_output(stdout: &str) -> Vec<AgentEvent> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    let unknown = || {
        vec![AgentEvent::Unknown {
            raw: trimmed.to_string(),
        }]
    };

    let doc = match serde_json::from_str::<Value>(trimmed) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::warn!(error = %e, "Agent batch output is not JSON");
            return unknown();
        }
    };
    if !is_result_document(&doc) {
        tracing::warn!("Agent batch output is not a result document");
        return unknown();
    }
    vec![result_event(&doc, batch_subtype(&doc))]
}

#[async_trait]
impl EventStreamReader for BatchReader {
    async fn read_events(&self, request: &AgentRequest) -> Result<Vec<AgentEvent>> {
        let mut cmd = process::agent_command(&self.binary, &self.args, &request.cwd);
        cmd.arg("-p")
            .arg(&request.prompt)
            .arg("--output-format")
            .arg("json")
            .arg("--max-turns")
            .arg(request.max_turns.to_string());
        if let Some(mode) = &self.permission_mode {
            cmd.arg("--permission-mode").arg(mode);
        }

        let mut child = process::spawn(&mut cmd, &self.binary)?;
        tracing::info!(
            binary = %self.binary.display(),
            max_turns = request.max_turns,
            timeout_secs = request.timeout.as_secs(),
            "Agent started (batch mode)"
        );

        let mut stdout_pipe = child
            .stdout
            .take()
            .ok_or_else(|| AppError::SpawnFailure("failed to capture stdout".to_string()))?;
        let stderr = process::drain(child.stderr.take());

        let mut stdout = String::new();
        let run = async {
            stdout_pipe.read_to_string(&mut stdout).await?;
            Ok::<_, AppError>(child.wait().await?)
        };
        let waited = tokio::time::timeout(request.timeout, run).await;

        let status = match waited {
            Ok(status) => status?,
            Err(_) => {
                let err = process::terminate(&mut child, request.timeout).await;
                stderr.abort();
                return Err(err);
            }
        };
        let stderr = stderr.await.unwrap_or_default();

        if let Some(path) = &request.transcript {
            if let Err(e) = tokio::fs::write(path, &stdout).await {
                tracing::warn!(path = %path.display(), error = %e, "Cannot write transcript file");
            }
        }

        let events = parse_batch_output(&stdout);
        if !status.success() && !events.iter().any(AgentEvent::is_usable) {
            return Err(process::exit_failure(status, stderr));
        }

        tracing::info!(code = ?status.code(), "Agent batch run finished");
        Ok(events)
    }
}
