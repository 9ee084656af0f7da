use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::config::{GitHubConfig, WorkspaceConfig};
use crate::error::Result;
use crate::workspace::{changes, git, Vcs};

/// The local checkout the agent works in, driven through git2.
pub struct GitWorkspace {
    path: PathBuf,
    remote: String,
    token: String,
}

impl GitWorkspace {
    pub fn new(workspace: &WorkspaceConfig, github: &GitHubConfig) -> Self {
        Self {
            path: workspace.repo_dir.clone(),
            remote: github.remote.clone(),
            token: github.token.clone(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn remote_url(&self) -> Result<String> {
        git::remote_url(&self.path, &self.remote).await
    }
}

#[async_trait]
impl Vcs for GitWorkspace {
    async fn create_branch(&self, branch: &str) -> Result<()> {
        git::create_branch(&self.path, branch).await
    }

    async fn change_summary(&self) -> String {
        changes::collect_changes(&self.path).await
    }

    async fn commit_all(&self, message: &str) -> Result<bool> {
        git::commit_all(&self.path, message).await
    }

    async fn push(&self, branch: &str) -> Result<()> {
        git::push(&self.path, &self.remote, branch, &self.token).await
    }
}
