pub mod issue;
pub mod types;

pub use issue::{IssuePipeline, PipelineSettings};
pub use types::{PipelineState, WorkflowOutcome};
