use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub github: GitHubConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub workspace: WorkspaceConfig,
}

#[derive(Deserialize, Clone)]
pub struct GitHubConfig {
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_base_branch")]
    pub base_branch: String,
    #[serde(default = "default_remote")]
    pub remote: String,
    /// Override for GitHub Enterprise installs.
    #[serde(default)]
    pub api_base: Option<String>,
}

// Manual Debug impl to avoid leaking the token
impl std::fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("token", &"[REDACTED]")
            .field("base_branch", &self.base_branch)
            .field("remote", &self.remote)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            base_branch: default_base_branch(),
            remote: default_remote(),
            api_base: None,
        }
    }
}

/// How the agent process reports its progress.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AgentMode {
    /// One JSON event per line while the agent runs.
    #[default]
    Stream,
    /// A single JSON document once the agent exits.
    Batch,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AgentConfig {
    #[serde(default)]
    pub mode: AgentMode,
    #[serde(default = "default_binary")]
    pub binary: PathBuf,
    /// Passed to the binary ahead of the generated flags.
    #[serde(default)]
    pub args: Vec<String>,
    /// Value for `--permission-mode`. An empty string omits the flag.
    #[serde(default = "default_permission_mode")]
    pub permission_mode: String,
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// When set, raw stream output is copied to `<dir>/issue-<n>.jsonl`.
    #[serde(default)]
    pub transcript_dir: Option<PathBuf>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            mode: AgentMode::default(),
            binary: default_binary(),
            args: Vec::new(),
            permission_mode: default_permission_mode(),
            max_turns: default_max_turns(),
            timeout_secs: default_timeout_secs(),
            transcript_dir: None,
        }
    }
}

impl AgentConfig {
    /// The permission mode to pass, if any.
    pub fn permission_mode_flag(&self) -> Option<String> {
        let mode = self.permission_mode.trim();
        (!mode.is_empty()).then(|| mode.to_string())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct WorkspaceConfig {
    #[serde(default = "default_repo_dir")]
    pub repo_dir: PathBuf,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            repo_dir: default_repo_dir(),
        }
    }
}

fn default_base_branch() -> String {
    "main".to_string()
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_binary() -> PathBuf {
    PathBuf::from("claude")
}

fn default_permission_mode() -> String {
    "acceptEdits".to_string()
}

fn default_max_turns() -> u32 {
    10
}

fn default_timeout_secs() -> u64 {
    600
}

fn default_repo_dir() -> PathBuf {
    PathBuf::from(".")
}

impl AppConfig {
    /// Load configuration from an optional file and `ZEZPLOYEE__*` env vars.
    ///
    /// `token` comes from the command line (or `GITHUB_TOKEN`) and wins over
    /// anything found in the file or environment.
    pub fn load(config_path: Option<&Path>, token: Option<String>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder.add_source(config::File::with_name("zezployee").required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("ZEZPLOYEE")
                .separator("__")
                .try_parsing(true),
        );

        builder = builder
            .set_override_option("github.token", token)
            .map_err(|e| AppError::Config(e.to_string()))?;

        let config: AppConfig = builder
            .build()
            .map_err(|e| AppError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| AppError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.github.token.trim().is_empty() {
            return Err(AppError::Config(
                "GitHub token required. Set GITHUB_TOKEN or use --token".to_string(),
            ));
        }
        if self.agent.max_turns == 0 {
            return Err(AppError::Config("agent.max_turns must be at least 1".to_string()));
        }
        if self.agent.timeout_secs == 0 {
            return Err(AppError::Config("agent.timeout_secs must be at least 1".to_string()));
        }
        Ok(())
    }
}
