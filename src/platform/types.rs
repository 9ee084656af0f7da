use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct RepoInfo {
    pub full_name: String,
    pub name: String,
    pub owner: String,
    pub url: String,
    pub default_branch: String,
}

/// An open issue (pull requests excluded).
#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct PullRequest {
    pub number: u64,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreatePullRequest {
    pub title: String,
    pub body: String,
    pub head_branch: String,
    pub base_branch: String,
}
