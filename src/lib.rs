pub mod agent;
pub mod config;
pub mod error;
pub mod platform;
pub mod selector;
pub mod workflow;
pub mod workspace;
