//! LLM provider adapters
//!
//! One client per vendor behind a single `LlmClient` enum. The vendor is
//! picked once from configuration; the moderation service only sees the
//! `LlmProvider` port.

pub mod anthropic;
pub mod gemini;
pub mod ollama;
pub mod openai;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

pub use anthropic::AnthropicClient;
pub use gemini::GeminiClient;
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;

use crate::config::{LlmConfig, ProviderKind};
use crate::domain::ports::LlmProvider;
use crate::error::{AppError, ConfigError, ProviderError};

/// Sampling temperature shared by every vendor
pub const TEMPERATURE: f32 = 0.2;
/// Output token cap shared by every vendor
pub const MAX_OUTPUT_TOKENS: u32 = 500;

/// The configured LLM vendor
#[derive(Debug)]
pub enum LlmClient {
    OpenAi(OpenAiClient),
    Anthropic(AnthropicClient),
    Gemini(GeminiClient),
    Ollama(OllamaClient),
}

impl LlmClient {
    /// Build the client named by `config.provider`
    pub fn from_config(config: &LlmConfig) -> Result<Self, AppError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ProviderError::Request)?;
        let model = config.model.clone();
        let base_url = config.host.clone();

        let api_key = || {
            config
                .api_key
                .clone()
                .ok_or_else(|| ConfigError::MissingApiKey(config.provider.to_string()))
        };

        let client = match config.provider {
            ProviderKind::OpenAi => {
                LlmClient::OpenAi(OpenAiClient::new(http, api_key()?, model, base_url))
            }
            ProviderKind::Anthropic => {
                LlmClient::Anthropic(AnthropicClient::new(http, api_key()?, model, base_url))
            }
            ProviderKind::Gemini => {
                LlmClient::Gemini(GeminiClient::new(http, api_key()?, model, base_url))
            }
            ProviderKind::Ollama => LlmClient::Ollama(OllamaClient::new(http, model, base_url)),
        };

        tracing::info!(provider = %config.provider, model = %config.model, "Configured LLM provider");
        Ok(client)
    }

    pub fn kind(&self) -> ProviderKind {
        match self {
            LlmClient::OpenAi(_) => ProviderKind::OpenAi,
            LlmClient::Anthropic(_) => ProviderKind::Anthropic,
            LlmClient::Gemini(_) => ProviderKind::Gemini,
            LlmClient::Ollama(_) => ProviderKind::Ollama,
        }
    }

    pub fn model(&self) -> &str {
        match self {
            LlmClient::OpenAi(c) => c.model(),
            LlmClient::Anthropic(c) => c.model(),
            LlmClient::Gemini(c) => c.model(),
            LlmClient::Ollama(c) => c.model(),
        }
    }
}

#[async_trait]
impl LlmProvider for LlmClient {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let text = match self {
            LlmClient::OpenAi(c) => c.generate(prompt).await?,
            LlmClient::Anthropic(c) => c.generate(prompt).await?,
            LlmClient::Gemini(c) => c.generate(prompt).await?,
            LlmClient::Ollama(c) => c.generate(prompt).await?,
        };
        tracing::debug!(provider = %self.kind(), chars = text.len(), "LLM response received");
        Ok(text)
    }
}

/// Map a vendor HTTP response to its JSON body or a `ProviderError`
pub(crate) async fn handle_response<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, ProviderError> {
    let status = response.status();

    if status.is_success() {
        response
            .json()
            .await
            .map_err(|e| ProviderError::Deserialization(e.to_string()))
    } else if status.as_u16() == 401 || status.as_u16() == 403 {
        Err(ProviderError::Unauthorized)
    } else if status.as_u16() == 429 {
        Err(ProviderError::RateLimited)
    } else {
        let message = response.text().await.unwrap_or_default();
        Err(ProviderError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// Treat blank model output as no output
pub(crate) fn non_empty(text: Option<String>) -> Result<String, ProviderError> {
    match text {
        Some(t) if !t.trim().is_empty() => Ok(t),
        _ => Err(ProviderError::EmptyResponse),
    }
}
