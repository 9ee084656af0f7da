pub mod client;
pub mod mapper;

pub use client::{parse_remote_url, GitHubPlatform};
