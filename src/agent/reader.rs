use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use crate::agent::batch::BatchReader;
use crate::agent::event::AgentEvent;
use crate::agent::stream::StreamingReader;
use crate::config::{AgentConfig, AgentMode};
use crate::error::Result;

/// Everything one agent invocation needs.
#[derive(Debug, Clone)]
pub struct AgentRequest {
    pub prompt: String,
    pub cwd: PathBuf,
    pub max_turns: u32,
    pub timeout: Duration,
    /// File that receives a copy of the raw output, if any.
    pub transcript: Option<PathBuf>,
}

/// Runs one agent process and returns its events in emission order.
///
/// Implementations own the spawned process for the duration of the call and
/// must kill it if `request.timeout` elapses, failing with `AppError::Timeout`.
#[async_trait]
pub trait EventStreamReader: Send + Sync {
    async fn read_events(&self, request: &AgentRequest) -> Result<Vec<AgentEvent>>;
}

/// Pick the reader implementation configured by `agent.mode`.
pub fn create_reader(config: &AgentConfig) -> Box<dyn EventStreamReader> {
    match config.mode {
        AgentMode::Stream => Box::new(
            StreamingReader::new(config.binary.clone())
                .with_args(config.args.clone())
                .with_permission_mode(config.permission_mode_flag()),
        ),
        AgentMode::Batch => Box::new(
            BatchReader::new(config.binary.clone())
                .with_args(config.args.clone())
                .with_permission_mode(config.permission_mode_flag()),
        ),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    /// Agent stand-in that reports its own argument list as an assistant turn.
    fn echo_args_config(dir: &std::path::Path, permission_mode: &str) -> AgentConfig {
        let script = dir.join("agent.sh");
        std::fs::write(
            &script,
            "printf '{\"type\":\"assistant\",\"message\":{\"content\":\"%s\"}}\\n' \"$*\"\n",
        )
        .unwrap();
        AgentConfig {
            binary: PathBuf::from("sh"),
            args: vec![script.display().to_string()],
            permission_mode: permission_mode.to_string(),
            ..AgentConfig::default()
        }
    }

    async fn invoked_args(config: &AgentConfig, dir: &std::path::Path) -> String {
        let request = AgentRequest {
            prompt: "fix".to_string(),
            cwd: dir.to_path_buf(),
            max_turns: 3,
            timeout: Duration::from_secs(10),
            transcript: None,
        };
        let events = create_reader(config).read_events(&request).await.unwrap();
        match &events[..] {
            [AgentEvent::Assistant { text }] => text.clone(),
            other => panic!("unexpected events {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_permission_mode_passed_through() {
        let tmp = tempfile::tempdir().unwrap();
        let config = echo_args_config(tmp.path(), "acceptEdits");
        let args = invoked_args(&config, tmp.path()).await;
        assert!(args.contains("--permission-mode acceptEdits"), "{args}");
        assert!(args.contains("--max-turns 3"), "{args}");
    }

    #[tokio::test]
    async fn test_empty_permission_mode_omits_flag() {
        let tmp = tempfile::tempdir().unwrap();
        let config = echo_args_config(tmp.path(), "");
        let args = invoked_args(&config, tmp.path()).await;
        assert!(!args.contains("--permission-mode"), "{args}");
    }
}
