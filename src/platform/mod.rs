pub mod github;
pub mod types;

use async_trait::async_trait;

use crate::error::Result;
use types::*;

#[async_trait]
pub trait Platform: Send + Sync {
    /// Describe the repository this platform is bound to.
    async fn repo_info(&self) -> Result<RepoInfo>;

    /// List every open issue, skipping pull requests.
    async fn list_open_issues(&self) -> Result<Vec<Issue>>;

    /// Create a pull request.
    async fn create_pull_request(&self, pr: &CreatePullRequest) -> Result<PullRequest>;

    /// Close an issue.
    async fn close_issue(&self, issue_number: u64) -> Result<()>;
}
