use std::path::Path;

use crate::workspace::git::{self, ChangeSet};

pub const NO_CHANGES: &str = "No changes detected";
pub const UNKNOWN_CHANGES: &str = "Could not determine changes";

impl ChangeSet {
    /// Markdown summary for a pull request body.
    pub fn render(&self) -> String {
        let mut sections = Vec::new();

        if !self.staged.trim().is_empty() {
            sections.push("**Staged changes:**".to_string());
            sections.push(self.staged.trim().to_string());
        }

        if !self.unstaged.trim().is_empty() {
            sections.push("**Unstaged changes:**".to_string());
            sections.push(self.unstaged.trim().to_string());
        }

        if !self.untracked.is_empty() {
            sections.push("**New files:**".to_string());
            sections.push(
                self.untracked
                    .iter()
                    .map(|path| format!("- {path}"))
                    .collect::<Vec<_>>()
                    .join("\n"),
            );
        }

        if sections.is_empty() {
            return NO_CHANGES.to_string();
        }
        sections.join("\n\n")
    }
}

/// Summarise the working tree. Never fails: inspection errors yield
/// [`UNKNOWN_CHANGES`].
pub async fn collect_changes(dir: &Path) -> String {
    let dir = dir.to_path_buf();

    let result = tokio::task::spawn_blocking(move || git::read_change_set(&dir)).await;

    match result {
        Ok(Ok(changes)) => changes.render(),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Failed to inspect working tree");
            UNKNOWN_CHANGES.to_string()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Change inspection task panicked");
            UNKNOWN_CHANGES.to_string()
        }
    }
}
