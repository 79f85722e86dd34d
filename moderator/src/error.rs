//! Unified error types for the modqueue moderator
//!
//! This module defines error types for each layer:
//! - `ConfigError`: configuration and rule-file problems (fatal at load time)
//! - `ProviderError`: LLM provider call failures (recovered per item)
//! - `PlatformError`: content platform (Reddit) API failures
//! - `AppError`: run-level errors surfaced to the binaries
//!
//! Unparseable model output and unknown rule numbers are deliberately absent:
//! both are ordinary decision inputs, not errors.

use std::path::PathBuf;

use thiserror::Error;

/// Configuration errors - abort the run before any item is processed
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Duplicate rule number: {0}")]
    DuplicateRule(String),

    #[error("Rule number is not an integer: {0}")]
    InvalidRuleNumber(String),

    #[error("Rule {rule} is missing required field '{field}'")]
    MissingField { rule: String, field: &'static str },

    #[error("No rules found in the rules file")]
    EmptyRuleSet,

    #[error("Invalid {name}: {value} (must be between 0.0 and 1.0)")]
    InvalidThreshold { name: &'static str, value: f64 },

    #[error("Unsupported LLM provider: {0}")]
    UnsupportedProvider(String),

    #[error("Unknown {kind}: {value}")]
    UnknownValue { kind: &'static str, value: String },

    #[error("Missing API key for provider {0}")]
    MissingApiKey(String),

    #[error("Missing required setting: {0}")]
    MissingSetting(&'static str),
}

/// LLM provider errors
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Unauthorized - invalid API key")]
    Unauthorized,

    #[error("Rate limited")]
    RateLimited,

    #[error("Provider returned no text")]
    EmptyResponse,

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

/// Content platform (Reddit) errors
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Unauthorized - invalid or expired token")]
    Unauthorized,

    #[error("Rate limited")]
    RateLimited,

    #[error("Item {0} has no author (deleted account)")]
    MissingAuthor(String),

    #[error("Unsupported action for item {item_id}: {action}")]
    UnsupportedAction { item_id: String, action: String },

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

/// Run-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Not found: {0}")]
    NotFound(String),
}
