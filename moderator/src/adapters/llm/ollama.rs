//! Ollama local inference client

use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{handle_response, non_empty, MAX_OUTPUT_TOKENS, TEMPERATURE};
use crate::app::SYSTEM_PROMPT;
use crate::error::ProviderError;

pub const DEFAULT_HOST: &str = "http://localhost:11434";

#[derive(Debug)]
pub struct OllamaClient {
    http: Client,
    host: String,
    model: String,
}

impl OllamaClient {
    pub fn new(http: Client, model: String, host: Option<String>) -> Self {
        let host = host.unwrap_or_else(|| DEFAULT_HOST.to_string());
        Self {
            http,
            host: host.trim_end_matches('/').to_string(),
            model,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let url = format!("{}/api/generate", self.host);
        tracing::debug!(url = %url, model = %self.model, "Sending request to Ollama");

        let response = self
            .http
            .post(url)
            .json(&self.request(prompt))
            .send()
            .await?;

        let body: GenerateResponse = handle_response(response).await?;
        non_empty(body.response)
    }

    fn request(&self, prompt: &str) -> GenerateRequest<'_> {
        GenerateRequest {
            model: &self.model,
            prompt: format!(
                "{}\n\n{}\n\nRemember to respond ONLY with the JSON object, nothing else.",
                SYSTEM_PROMPT, prompt
            ),
            stream: false,
            options: Options {
                temperature: TEMPERATURE,
                num_predict: MAX_OUTPUT_TOKENS,
            },
        }
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    options: Options,
}

#[derive(Serialize)]
struct Options {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}
