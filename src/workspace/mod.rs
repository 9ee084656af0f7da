pub mod changes;
pub mod git;
pub mod manager;

use async_trait::async_trait;

use crate::error::Result;

pub use manager::GitWorkspace;

/// Working-tree operations the pipeline needs.
#[async_trait]
pub trait Vcs: Send + Sync {
    /// Create and check out `branch` from the current HEAD.
    async fn create_branch(&self, branch: &str) -> Result<()>;

    /// Read-only summary of staged, unstaged and new files.
    async fn change_summary(&self) -> String;

    /// Commit whatever the agent left uncommitted. `false` if nothing was left.
    async fn commit_all(&self, message: &str) -> Result<bool>;

    /// Push `branch` and set its upstream.
    async fn push(&self, branch: &str) -> Result<()>;
}
