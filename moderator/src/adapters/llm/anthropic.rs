//! Anthropic messages API client

use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{handle_response, non_empty, MAX_OUTPUT_TOKENS, TEMPERATURE};
use crate::app::SYSTEM_PROMPT;
use crate::config::mask_secret;
use crate::error::ProviderError;

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const API_VERSION: &str = "2023-06-01";

pub struct AnthropicClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl AnthropicClient {
    pub fn new(http: Client, api_key: String, model: String, base_url: Option<String>) -> Self {
        let base_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let response = self
            .http
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&self.request(prompt))
            .send()
            .await?;

        let body: MessagesResponse = handle_response(response).await?;
        extract_text(body)
    }

    fn request<'a>(&'a self, prompt: &'a str) -> MessagesRequest<'a> {
        MessagesRequest {
            model: &self.model,
            max_tokens: MAX_OUTPUT_TOKENS,
            temperature: TEMPERATURE,
            system: SYSTEM_PROMPT,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        }
    }
}

impl std::fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &mask_secret(&self.api_key))
            .finish()
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

/// Concatenate the text blocks of a response
fn extract_text(body: MessagesResponse) -> Result<String, ProviderError> {
    let text: String = body
        .content
        .into_iter()
        .filter(|block| block.block_type == "text")
        .filter_map(|block| block.text)
        .collect();
    non_empty(Some(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let client = AnthropicClient::new(
            Client::new(),
            "key".to_string(),
            "claude-3-opus-20240229".to_string(),
            None,
        );
        let value = serde_json::to_value(client.request("judge this")).unwrap();

        assert_eq!(value["model"], "claude-3-opus-20240229");
        assert_eq!(value["max_tokens"], 500);
        assert_eq!(value["system"], SYSTEM_PROMPT);
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "judge this");
        assert_eq!(client.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_extract_text_joins_text_blocks() {
        let body: MessagesResponse = serde_json::from_str(
            r#"{"id": "msg_1", "content": [{"type": "text", "text": "{\"violates\": "}, {"type": "tool_use", "id": "t"}, {"type": "text", "text": "true}"}]}"#,
        )
        .unwrap();
        assert_eq!(extract_text(body).unwrap(), r#"{"violates": true}"#);
    }

    #[test]
    fn test_extract_text_empty() {
        let body: MessagesResponse = serde_json::from_str(r#"{"content": []}"#).unwrap();
        assert!(matches!(extract_text(body), Err(ProviderError::EmptyResponse)));
    }
}
