pub mod batch;
pub mod event;
pub mod outcome;
pub mod process;
pub mod prompt;
pub mod reader;
pub mod stream;

pub use event::AgentEvent;
pub use outcome::{reduce, Outcome};
pub use reader::{create_reader, AgentRequest, EventStreamReader};
