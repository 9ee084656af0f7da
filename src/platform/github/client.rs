use async_trait::async_trait;
use octocrab::params::State;
use octocrab::Octocrab;

use crate::config::GitHubConfig;
use crate::error::{AppError, Result};
use crate::platform::types::*;
use crate::platform::Platform;

use super::mapper;

/// GitHub REST client bound to one repository.
pub struct GitHubPlatform {
    client: Octocrab,
    owner: String,
    repo: String,
}

impl GitHubPlatform {
    /// Build a client authenticated with the configured token for the
    /// repository behind `remote_url`.
    pub fn new(config: &GitHubConfig, remote_url: &str) -> Result<Self> {
        let (owner, repo) = parse_remote_url(remote_url)?;

        let mut builder = Octocrab::builder().personal_token(config.token.clone());
        if let Some(base) = &config.api_base {
            builder = builder
                .base_uri(base.as_str())
                .map_err(|e| AppError::Config(format!("Invalid GitHub API base {base}: {e}")))?;
        }
        let client = builder
            .build()
            .map_err(|e| AppError::GitHubApi(format!("Failed to build octocrab client: {e}")))?;

        Ok(Self {
            client,
            owner,
            repo,
        })
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

/// Extract `(owner, repo)` from an SSH or HTTPS GitHub remote URL.
pub fn parse_remote_url(url: &str) -> Result<(String, String)> {
    let url = url.trim();
    let path = if let Some(rest) = url.strip_prefix("git@github.com:") {
        rest
    } else if let Some(rest) = url.strip_prefix("ssh://git@github.com/") {
        rest
    } else if let Some(idx) = url.find("github.com/") {
        &url[idx + "github.com/".len()..]
    } else {
        return Err(AppError::GitHubApi(format!(
            "Not a GitHub repository: {url}"
        )));
    };

    let path = path.trim_end_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    let parts: Vec<&str> = path.splitn(2, '/').collect();
    match parts.as_slice() {
        [owner, repo] if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
            Ok((owner.to_string(), repo.to_string()))
        }
        _ => Err(AppError::GitHubApi(format!("Invalid repo path in remote: {url}"))),
    }
}

#[async_trait]
impl Platform for GitHubPlatform {
    async fn repo_info(&self) -> Result<RepoInfo> {
        let repo = self.client.repos(&self.owner, &self.repo).get().await?;
        Ok(mapper::map_repo(repo, &self.owner))
    }

    async fn list_open_issues(&self) -> Result<Vec<Issue>> {
        let first_page = self
            .client
            .issues(&self.owner, &self.repo)
            .list()
            .state(State::Open)
            .per_page(100)
            .send()
            .await?;

        let all = self.client.all_pages(first_page).await?;
        let total = all.len();

        let issues: Vec<Issue> = all
            .into_iter()
            // The issues endpoint also returns pull requests
            .filter(|issue| issue.pull_request.is_none())
            .map(mapper::map_issue)
            .collect();

        tracing::debug!(
            repo = %self.full_name(),
            fetched = total,
            issues = issues.len(),
            "Listed open issues"
        );
        Ok(issues)
    }

    async fn create_pull_request(&self, pr: &CreatePullRequest) -> Result<PullRequest> {
        let created = self
            .client
            .pulls(&self.owner, &self.repo)
            .create(&pr.title, &pr.head_branch, &pr.base_branch)
            .body(&pr.body)
            .send()
            .await
            .map_err(|e| AppError::Publication(format!("Failed to create pull request: {e}")))?;

        Ok(mapper::map_pull_request(created))
    }

    async fn close_issue(&self, issue_number: u64) -> Result<()> {
        self.client
            .issues(&self.owner, &self.repo)
            .update(issue_number)
            .state(octocrab::models::IssueState::Closed)
            .send()
            .await
            .map_err(|e| {
                AppError::Publication(format!("Failed to close issue #{issue_number}: {e}"))
            })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ssh_remote() {
        let (owner, repo) = parse_remote_url("git@github.com:octo/widgets.git").unwrap();
        assert_eq!(owner, "octo");
        assert_eq!(repo, "widgets");
    }

    #[test]
    fn test_parse_https_remote() {
        let (owner, repo) = parse_remote_url("https://github.com/octo/widgets.git").unwrap();
        assert_eq!((owner.as_str(), repo.as_str()), ("octo", "widgets"));

        let (owner, repo) = parse_remote_url("https://github.com/octo/widgets").unwrap();
        assert_eq!((owner.as_str(), repo.as_str()), ("octo", "widgets"));
    }

    #[test]
    fn test_parse_https_remote_with_credentials() {
        let (owner, repo) =
            parse_remote_url("https://x-access-token@github.com/octo/widgets.git").unwrap();
        assert_eq!((owner.as_str(), repo.as_str()), ("octo", "widgets"));
    }

    #[test]
    fn test_parse_ssh_url_form() {
        let (owner, repo) = parse_remote_url("ssh://git@github.com/octo/widgets.git").unwrap();
        assert_eq!((owner.as_str(), repo.as_str()), ("octo", "widgets"));
    }

    #[test]
    fn test_rejects_non_github_remote() {
        let err = parse_remote_url("https://gitlab.com/octo/widgets.git").unwrap_err();
        assert!(err.to_string().contains("Not a GitHub repository"));
    }

    #[test]
    fn test_rejects_incomplete_path() {
        assert!(parse_remote_url("https://github.com/octo").is_err());
        assert!(parse_remote_url("git@github.com:octo/widgets/extra.git").is_err());
    }
}
