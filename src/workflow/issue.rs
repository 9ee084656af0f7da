use std::path::PathBuf;
use std::time::Duration;

use crate::agent::prompt;
use crate::agent::{reduce, AgentRequest, EventStreamReader, Outcome};
use crate::config::AppConfig;
use crate::error::Result;
use crate::platform::types::{CreatePullRequest, Issue};
use crate::platform::Platform;
use crate::workflow::types::{PipelineState, WorkflowOutcome};
use crate::workspace::Vcs;

const ISSUE_BODY_PREVIEW_CHARS: usize = 500;

/// Per-run knobs taken from configuration.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub base_branch: String,
    pub cwd: PathBuf,
    pub max_turns: u32,
    pub timeout: Duration,
    pub transcript_dir: Option<PathBuf>,
}

impl PipelineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            base_branch: config.github.base_branch.clone(),
            cwd: config.workspace.repo_dir.clone(),
            max_turns: config.agent.max_turns,
            timeout: Duration::from_secs(config.agent.timeout_secs),
            transcript_dir: config.agent.transcript_dir.clone(),
        }
    }
}

pub fn branch_name(issue_number: u64) -> String {
    format!("issue-{issue_number}")
}

/// Drives one issue from branch creation to a published PR or an abort.
pub struct IssuePipeline<'a> {
    platform: &'a dyn Platform,
    vcs: &'a dyn Vcs,
    reader: &'a dyn EventStreamReader,
    settings: PipelineSettings,
    state: PipelineState,
}

impl<'a> IssuePipeline<'a> {
    pub fn new(
        platform: &'a dyn Platform,
        vcs: &'a dyn Vcs,
        reader: &'a dyn EventStreamReader,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            platform,
            vcs,
            reader,
            settings,
            state: PipelineState::Idle,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    fn transition(&mut self, next: PipelineState) {
        tracing::debug!(from = ?self.state, to = ?next, "Pipeline state change");
        self.state = next;
    }

    /// Run the whole pipeline for `issue`.
    ///
    /// Agent-side problems come back as `WorkflowOutcome::Aborted`. Branch,
    /// push and publication errors are returned as `Err` after moving to
    /// `Aborted`.
    pub async fn run(&mut self, issue: &Issue) -> Result<WorkflowOutcome> {
        let branch = branch_name(issue.number);

        if let Err(e) = self.vcs.create_branch(&branch).await {
            tracing::error!(issue = issue.number, branch = %branch, error = %e, "Failed to create branch");
            self.transition(PipelineState::Aborted);
            return Err(e);
        }
        self.transition(PipelineState::BranchCreated);
        tracing::info!(issue = issue.number, branch = %branch, "Created branch");

        self.transition(PipelineState::AgentRunning);
        let outcome = self.invoke_agent(issue).await;
        self.transition(PipelineState::OutcomeKnown);
        tracing::info!(
            issue = issue.number,
            success = outcome.is_success(),
            cost_usd = outcome.cost_usd(),
            turns = outcome.turn_count(),
            "Agent outcome"
        );

        match outcome {
            Outcome::Success {
                output,
                session_id,
                cost_usd,
                turn_count,
                raw_events,
            } => {
                tracing::info!(
                    issue = issue.number,
                    session_id = session_id.as_deref().unwrap_or("-"),
                    events = raw_events.len(),
                    "Agent succeeded"
                );

                // Must run before anything touches the tree
                let changes = self.vcs.change_summary().await;

                match self.publish(issue, &branch, &output, &changes).await {
                    Ok((pr_number, pr_url)) => {
                        self.transition(PipelineState::Published);
                        Ok(WorkflowOutcome::Published {
                            pr_number,
                            pr_url,
                            cost_usd,
                            turn_count,
                        })
                    }
                    Err(e) => {
                        tracing::error!(issue = issue.number, error = %e, "Publication failed");
                        self.transition(PipelineState::Aborted);
                        Err(e)
                    }
                }
            }
            other => {
                let reason = other
                    .reason()
                    .unwrap_or_else(|| "unknown failure".to_string());
                tracing::warn!(
                    issue = issue.number,
                    branch = %branch,
                    reason = %reason,
                    "Agent did not succeed, leaving branch for inspection"
                );
                self.transition(PipelineState::Aborted);
                Ok(WorkflowOutcome::Aborted {
                    reason,
                    cost_usd: other.cost_usd(),
                    turn_count: other.turn_count(),
                })
            }
        }
    }

    async fn invoke_agent(&self, issue: &Issue) -> Outcome {
        let request = AgentRequest {
            prompt: prompt::prompt_for_issue(issue),
            cwd: self.settings.cwd.clone(),
            max_turns: self.settings.max_turns,
            timeout: self.settings.timeout,
            transcript: self
                .settings
                .transcript_dir
                .as_ref()
                .map(|dir| dir.join(format!("issue-{}.jsonl", issue.number))),
        };

        match self.reader.read_events(&request).await {
            Ok(events) => reduce(events),
            Err(e) => {
                tracing::error!(issue = issue.number, error = %e, "Agent invocation failed");
                Outcome::failed(e.to_string())
            }
        }
    }

    async fn publish(
        &self,
        issue: &Issue,
        branch: &str,
        agent_summary: &str,
        changes: &str,
    ) -> Result<(u64, String)> {
        let commit_msg = format!(
            "fix: resolve #{} - {}\n\n{}",
            issue.number,
            issue.title,
            agent_summary.trim()
        );
        if !self.vcs.commit_all(commit_msg.trim_end()).await? {
            tracing::info!(issue = issue.number, "No uncommitted changes left by agent");
        }

        self.vcs.push(branch).await?;
        tracing::info!(branch = %branch, "Pushed branch");

        let pr = self
            .platform
            .create_pull_request(&CreatePullRequest {
                title: format!("Fix issue #{}: {}", issue.number, issue.title),
                body: pull_request_body(issue, agent_summary, changes),
                head_branch: branch.to_string(),
                base_branch: self.settings.base_branch.clone(),
            })
            .await?;
        tracing::info!(pr = pr.number, url = %pr.url, "Opened pull request");

        self.platform.close_issue(issue.number).await?;
        tracing::info!(issue = issue.number, "Closed issue");

        Ok((pr.number, pr.url))
    }
}

/// Cut `text` to `max` characters, marking the cut with `...`.
fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

pub fn pull_request_body(issue: &Issue, agent_summary: &str, changes: &str) -> String {
    let summary_section = if agent_summary.trim().is_empty() {
        String::new()
    } else {
        format!("## Summary\n{}\n\n", agent_summary.trim())
    };

    format!(
        "Fixes #{number}\n\n{summary_section}## Changes Made\n{changes}\n\n## Issue Description\n{body}\n\n---\n*Automated by zezployee*",
        number = issue.number,
        body = truncate_chars(&issue.body, ISSUE_BODY_PREVIEW_CHARS),
    )
}
