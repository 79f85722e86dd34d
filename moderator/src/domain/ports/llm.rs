//! LLM provider port trait
//!
//! The only capability the moderation core needs from a language model.

use async_trait::async_trait;

use crate::error::ProviderError;

/// Text generation backed by some language model
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a prompt and return the model's raw text answer.
    ///
    /// Timeouts are the implementation's concern; any failure is reported
    /// as a `ProviderError` and treated by callers as "no usable verdict".
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}
