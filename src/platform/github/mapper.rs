use crate::platform::types;

/// Map an octocrab Issue to our platform Issue type.
pub fn map_issue(issue: octocrab::models::issues::Issue) -> types::Issue {
    types::Issue {
        number: issue.number,
        title: issue.title,
        body: issue.body.unwrap_or_default(),
        labels: issue.labels.into_iter().map(|l| l.name).collect(),
        created_at: Some(issue.created_at),
        url: issue.html_url.to_string(),
    }
}

pub fn map_pull_request(pr: octocrab::models::pulls::PullRequest) -> types::PullRequest {
    types::PullRequest {
        number: pr.number,
        url: pr.html_url.map(|u| u.to_string()).unwrap_or_default(),
    }
}

pub fn map_repo(repo: octocrab::models::Repository, owner: &str) -> types::RepoInfo {
    types::RepoInfo {
        full_name: repo
            .full_name
            .unwrap_or_else(|| format!("{owner}/{}", repo.name)),
        owner: repo
            .owner
            .map(|o| o.login)
            .unwrap_or_else(|| owner.to_string()),
        name: repo.name,
        url: repo.html_url.map(|u| u.to_string()).unwrap_or_default(),
        default_branch: repo.default_branch.unwrap_or_else(|| "main".to_string()),
    }
}
