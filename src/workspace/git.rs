use std::path::Path;

use git2::{
    Cred, DiffStatsFormat, IndexAddOption, PushOptions, RemoteCallbacks, Repository, Signature,
    StatusOptions,
};

use crate::error::{AppError, Result};

/// Validate a branch name to prevent argument injection.
/// Rejects names starting with `-` as defence in depth.
fn validate_branch_name(name: &str) -> Result<()> {
    if name.starts_with('-') {
        return Err(AppError::Git(format!(
            "Invalid branch name (starts with '-'): {name}"
        )));
    }
    Ok(())
}

/// Build `PushOptions` that authenticate via credential callback.
/// The token is captured by the closure and never written to disk.
fn make_push_options(token: &str) -> PushOptions<'_> {
    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(move |_url, _username_from_url, _allowed_types| {
        Cred::userpass_plaintext("x-access-token", token)
    });
    let mut opts = PushOptions::new();
    opts.remote_callbacks(callbacks);
    opts
}

/// Token auth only works over HTTPS, so SSH GitHub remotes are rewritten.
fn https_push_url(url: &str) -> String {
    if let Some(path) = url.strip_prefix("git@github.com:") {
        format!("https://github.com/{path}")
    } else if let Some(path) = url.strip_prefix("ssh://git@github.com/") {
        format!("https://github.com/{path}")
    } else {
        url.to_string()
    }
}

/// Read the URL of a named remote.
pub async fn remote_url(dir: &Path, remote: &str) -> Result<String> {
    let dir = dir.to_path_buf();
    let remote = remote.to_string();

    tokio::task::spawn_blocking(move || {
        let repo = Repository::open(&dir)?;
        let found = repo.find_remote(&remote)?;
        found
            .url()
            .map(str::to_string)
            .ok_or_else(|| AppError::Git(format!("Remote '{remote}' has no URL")))
    })
    .await
    .map_err(|e| AppError::Git(format!("Remote-url task panicked: {e}")))?
}

/// Create and checkout a new branch from HEAD. Fails if it already exists.
pub async fn create_branch(dir: &Path, branch_name: &str) -> Result<()> {
    validate_branch_name(branch_name)?;

    let dir = dir.to_path_buf();
    let branch_name = branch_name.to_string();

    tokio::task::spawn_blocking(move || {
        let repo = Repository::open(&dir)?;
        let head = repo.head()?;
        let commit = head.peel_to_commit()?;
        repo.branch(&branch_name, &commit, false)?;
        let obj = repo.revparse_single(&format!("refs/heads/{branch_name}"))?;
        repo.checkout_tree(&obj, None)?;
        repo.set_head(&format!("refs/heads/{branch_name}"))?;
        Ok(())
    })
    .await
    .map_err(|e| AppError::Git(format!("Create-branch task panicked: {e}")))?
}

/// Stage everything and commit it. Returns `false` when there was nothing to commit.
pub async fn commit_all(dir: &Path, message: &str) -> Result<bool> {
    let dir = dir.to_path_buf();
    let message = message.to_string();

    tokio::task::spawn_blocking(move || {
        let repo = Repository::open(&dir)?;
        let mut index = repo.index()?;
        index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None)?;
        index.update_all(["*"].iter(), None)?;
        index.write()?;

        let tree_oid = index.write_tree()?;
        let parent = repo.head()?.peel_to_commit()?;
        if parent.tree_id() == tree_oid {
            return Ok(false);
        }

        let tree = repo.find_tree(tree_oid)?;
        let sig = repo
            .signature()
            .or_else(|_| Signature::now("zezployee", "zezployee@users.noreply.github.com"))?;
        repo.commit(Some("HEAD"), &sig, &sig, &message, &tree, &[&parent])?;
        Ok(true)
    })
    .await
    .map_err(|e| AppError::Git(format!("Commit task panicked: {e}")))?
}

/// Push a branch and record `remote/branch` as its upstream (`git push -u`).
pub async fn push(dir: &Path, remote_name: &str, branch_name: &str, token: &str) -> Result<()> {
    validate_branch_name(branch_name)?;

    let dir = dir.to_path_buf();
    let remote_name = remote_name.to_string();
    let branch_name = branch_name.to_string();
    let token = token.to_string();

    tokio::task::spawn_blocking(move || {
        let repo = Repository::open(&dir)?;
        let url = repo
            .find_remote(&remote_name)?
            .url()
            .map(https_push_url)
            .ok_or_else(|| AppError::Git(format!("Remote '{remote_name}' has no URL")))?;

        let mut remote = repo.remote_anonymous(&url)?;
        let refspec = format!("refs/heads/{branch_name}:refs/heads/{branch_name}");
        let mut push_opts = make_push_options(&token);
        remote.push(&[&refspec], Some(&mut push_opts))?;

        // Anonymous remotes do not update tracking refs, so record them by hand
        let head = repo
            .find_reference(&format!("refs/heads/{branch_name}"))?
            .peel_to_commit()?;
        repo.reference(
            &format!("refs/remotes/{remote_name}/{branch_name}"),
            head.id(),
            true,
            "push",
        )?;
        let mut config = repo.config()?;
        config.set_str(&format!("branch.{branch_name}.remote"), &remote_name)?;
        config.set_str(
            &format!("branch.{branch_name}.merge"),
            &format!("refs/heads/{branch_name}"),
        )?;
        Ok(())
    })
    .await
    .map_err(|e| AppError::Git(format!("Push task panicked: {e}")))?
}

/// Raw material for a change summary: `--stat` style text for staged and
/// unstaged diffs plus untracked paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub staged: String,
    pub unstaged: String,
    pub untracked: Vec<String>,
}

fn stat_text(diff: &git2::Diff<'_>) -> Result<String> {
    let stats = diff.stats()?;
    if stats.files_changed() == 0 {
        return Ok(String::new());
    }
    let buf = stats.to_buf(DiffStatsFormat::FULL, 80)?;
    Ok(buf.as_str().unwrap_or_default().trim_end().to_string())
}

/// Inspect the working tree without modifying it.
pub fn read_change_set(dir: &Path) -> Result<ChangeSet> {
    let repo = Repository::open(dir)?;

    // An unborn HEAD compares the index against an empty tree
    let head_tree = match repo.head() {
        Ok(head) => Some(head.peel_to_tree()?),
        Err(_) => None,
    };

    let staged = repo.diff_tree_to_index(head_tree.as_ref(), None, None)?;
    let unstaged = repo.diff_index_to_workdir(None, None)?;

    let mut opts = StatusOptions::new();
    opts.include_untracked(true)
        .recurse_untracked_dirs(true)
        .include_ignored(false)
        .exclude_submodules(true);
    let statuses = repo.statuses(Some(&mut opts))?;
    let mut untracked: Vec<String> = statuses
        .iter()
        .filter(|entry| entry.status().is_wt_new())
        .filter_map(|entry| entry.path().map(str::to_string))
        .collect();
    untracked.sort();

    Ok(ChangeSet {
        staged: stat_text(&staged)?,
        unstaged: stat_text(&unstaged)?,
        untracked,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::fs;

    /// A repository with one committed file on `main`.
    pub(crate) fn init_repo(dir: &Path) -> Repository {
        let repo = Repository::init(dir).unwrap();
        {
            let mut config = repo.config().unwrap();
            config.set_str("user.name", "Test").unwrap();
            config.set_str("user.email", "test@example.com").unwrap();
        }
        fs::write(dir.join("README.md"), "hello\n").unwrap();
        {
            let mut index = repo.index().unwrap();
            index.add_path(Path::new("README.md")).unwrap();
            index.write().unwrap();
            let tree_id = index.write_tree().unwrap();
            let tree = repo.find_tree(tree_id).unwrap();
            let sig = Signature::now("Test", "test@example.com").unwrap();
            repo.commit(Some("refs/heads/main"), &sig, &sig, "init", &tree, &[])
                .unwrap();
        }
        repo.set_head("refs/heads/main").unwrap();
        repo
    }

    #[test]
    fn test_validate_branch_name_rejects_dash_prefix() {
        assert!(validate_branch_name("-evil").is_err());
        assert!(validate_branch_name("--upload-pack").is_err());
    }

    #[test]
    fn test_validate_branch_name_accepts_normal() {
        assert!(validate_branch_name("main").is_ok());
        assert!(validate_branch_name("issue-42").is_ok());
    }

    #[test]
    fn test_https_push_url() {
        assert_eq!(
            https_push_url("git@github.com:octo/widgets.git"),
            "https://github.com/octo/widgets.git"
        );
        assert_eq!(
            https_push_url("https://github.com/octo/widgets.git"),
            "https://github.com/octo/widgets.git"
        );
    }

    #[tokio::test]
    async fn test_create_branch_checks_out() {
        let tmp = tempfile::tempdir().unwrap();
        init_repo(tmp.path());

        create_branch(tmp.path(), "issue-42").await.unwrap();

        let repo = Repository::open(tmp.path()).unwrap();
        assert_eq!(repo.head().unwrap().shorthand(), Some("issue-42"));
    }

    #[tokio::test]
    async fn test_create_branch_twice_fails() {
        let tmp = tempfile::tempdir().unwrap();
        init_repo(tmp.path());

        create_branch(tmp.path(), "issue-7").await.unwrap();
        assert!(create_branch(tmp.path(), "issue-7").await.is_err());
    }

    #[tokio::test]
    async fn test_commit_all_includes_new_and_modified_files() {
        let tmp = tempfile::tempdir().unwrap();
        init_repo(tmp.path());
        fs::write(tmp.path().join("README.md"), "hello world\n").unwrap();
        fs::write(tmp.path().join("new.txt"), "new\n").unwrap();

        assert!(commit_all(tmp.path(), "fix: things").await.unwrap());
        assert_eq!(read_change_set(tmp.path()).unwrap(), ChangeSet::default());

        // Nothing left to commit
        assert!(!commit_all(tmp.path(), "again").await.unwrap());
    }

    #[tokio::test]
    async fn test_push_to_local_bare_remote_sets_upstream() {
        let tmp = tempfile::tempdir().unwrap();
        let work = tmp.path().join("work");
        let bare = tmp.path().join("remote.git");
        fs::create_dir_all(&work).unwrap();
        Repository::init_bare(&bare).unwrap();
        let repo = init_repo(&work);
        repo.remote("origin", &bare.display().to_string()).unwrap();

        create_branch(&work, "issue-3").await.unwrap();
        push(&work, "origin", "issue-3", "unused-token").await.unwrap();

        let remote_repo = Repository::open_bare(&bare).unwrap();
        assert!(remote_repo.find_reference("refs/heads/issue-3").is_ok());

        let repo = Repository::open(&work).unwrap();
        let config = repo.config().unwrap().snapshot().unwrap();
        assert_eq!(config.get_str("branch.issue-3.remote").unwrap(), "origin");
        assert_eq!(
            config.get_str("branch.issue-3.merge").unwrap(),
            "refs/heads/issue-3"
        );
        assert!(repo.find_reference("refs/remotes/origin/issue-3").is_ok());
    }

    #[tokio::test]
    async fn test_remote_url() {
        let tmp = tempfile::tempdir().unwrap();
        let repo = init_repo(tmp.path());
        repo.remote("origin", "git@github.com:octo/widgets.git").unwrap();

        let url = remote_url(tmp.path(), "origin").await.unwrap();
        assert_eq!(url, "git@github.com:octo/widgets.git");
        assert!(remote_url(tmp.path(), "upstream").await.is_err());
    }

    #[test]
    fn test_change_set_clean_tree() {
        let tmp = tempfile::tempdir().unwrap();
        init_repo(tmp.path());
        assert_eq!(read_change_set(tmp.path()).unwrap(), ChangeSet::default());
    }

    #[test]
    fn test_change_set_staged_and_unstaged() {
        let tmp = tempfile::tempdir().unwrap();
        let repo = init_repo(tmp.path());

        fs::write(tmp.path().join("README.md"), "hello\nstaged\n").unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new("README.md")).unwrap();
        index.write().unwrap();
        fs::write(tmp.path().join("README.md"), "hello\nstaged\nunstaged\n").unwrap();

        let changes = read_change_set(tmp.path()).unwrap();
        assert!(changes.staged.contains("README.md"));
        assert!(changes.staged.contains("1 file changed"));
        assert!(changes.unstaged.contains("README.md"));
        assert!(changes.untracked.is_empty());
    }

    #[test]
    fn test_change_set_untracked_recurses() {
        let tmp = tempfile::tempdir().unwrap();
        init_repo(tmp.path());
        fs::create_dir_all(tmp.path().join("src/nested")).unwrap();
        fs::write(tmp.path().join("src/nested/mod.rs"), "").unwrap();
        fs::write(tmp.path().join("b.txt"), "b").unwrap();

        let changes = read_change_set(tmp.path()).unwrap();
        assert_eq!(changes.untracked, vec!["b.txt", "src/nested/mod.rs"]);
        assert!(changes.staged.is_empty());
        assert!(changes.unstaged.is_empty());
    }
}
