/// Where a pipeline run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    BranchCreated,
    AgentRunning,
    OutcomeKnown,
    Published,
    Aborted,
}

/// Outcome of a workflow execution.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowOutcome {
    /// The branch was pushed, a PR opened and the issue closed.
    Published {
        pr_number: u64,
        pr_url: String,
        cost_usd: f64,
        turn_count: u32,
    },
    /// The agent did not succeed; nothing was pushed.
    Aborted {
        reason: String,
        cost_usd: f64,
        turn_count: u32,
    },
}
