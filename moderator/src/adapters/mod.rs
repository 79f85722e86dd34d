//! Adapters layer
//!
//! Implementations of port traits for external systems.

pub mod llm;
pub mod reddit;

pub use llm::LlmClient;
pub use reddit::RedditClient;
