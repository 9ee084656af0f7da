use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    #[error("Git operation failed: {0}")]
    Git(String),

    #[error("Failed to start agent: {0}")]
    SpawnFailure(String),

    #[error("Agent timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("Agent exited with code {code:?}: {stderr}")]
    AgentExited { code: Option<i32>, stderr: String },

    #[error("Publication failed: {0}")]
    Publication(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<octocrab::Error> for AppError {
    fn from(e: octocrab::Error) -> Self {
        AppError::GitHubApi(e.to_string())
    }
}

impl From<git2::Error> for AppError {
    fn from(e: git2::Error) -> Self {
        AppError::Git(e.message().to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
