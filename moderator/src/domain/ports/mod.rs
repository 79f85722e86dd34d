//! Domain ports (traits)
//!
//! Port traits define interfaces that the domain layer requires.
//! Adapters provide concrete implementations of these traits.

pub mod llm;
pub mod platform;

pub use llm::LlmProvider;
pub use platform::ContentPlatform;
