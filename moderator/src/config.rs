//! Configuration
//!
//! Loaded from a YAML file with secrets optionally supplied through the
//! environment (a `.env` file is honored). Everything is validated here so
//! a bad setting fails the run before any item is touched.

use std::env;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::app::{ConfidenceScale, DecisionPolicy, DEFAULT_THRESHOLD};
use crate::error::ConfigError;

pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";
pub const DEFAULT_RULES_PATH: &str = "rules.yaml";
pub const DEFAULT_QUEUE_LIMIT: u32 = 100;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Supported LLM vendors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProviderKind {
    #[default]
    OpenAi,
    Anthropic,
    Gemini,
    Ollama,
}

impl ProviderKind {
    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "gpt-4-turbo",
            ProviderKind::Anthropic => "claude-3-opus-20240229",
            ProviderKind::Gemini => "gemini-1.5-pro",
            ProviderKind::Ollama => "llama3",
        }
    }

    /// Local Ollama runs without credentials
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, ProviderKind::Ollama)
    }

    /// Name of the per-provider section in the config file
    pub fn section(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Gemini => "gemini",
            ProviderKind::Ollama => "ollama",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.section())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "anthropic" | "claude" => Ok(ProviderKind::Anthropic),
            "gemini" | "google" => Ok(ProviderKind::Gemini),
            "ollama" => Ok(ProviderKind::Ollama),
            _ => Err(format!("Unsupported LLM provider: {}", s)),
        }
    }
}

/// Reddit script-app credentials
#[derive(Clone)]
pub struct RedditConfig {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    pub user_agent: String,
}

impl std::fmt::Debug for RedditConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedditConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &mask_secret(&self.client_secret))
            .field("username", &self.username)
            .field("password", &"********")
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Resolved provider settings (generic `llm` section merged with the
/// provider's own section)
#[derive(Clone)]
pub struct LlmConfig {
    pub provider: ProviderKind,
    pub model: String,
    pub api_key: Option<String>,
    /// Base URL override; required only for self-hosted endpoints
    pub host: Option<String>,
    pub timeout: Duration,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_deref().map(mask_secret))
            .field("host", &self.host)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub reddit: RedditConfig,
    pub llm: LlmConfig,
    pub policy: DecisionPolicy,
    pub confidence_scale: ConfidenceScale,
    /// Maximum number of queued items fetched per run
    pub queue_limit: u32,
}

impl AppConfig {
    /// Load the config file, reading `.env` first for secrets.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&yaml)?;
        tracing::debug!(path = %path.display(), config = ?config, "Loaded configuration");
        Ok(config)
    }

    /// Parse configuration, taking overrides from the process environment
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Self::from_yaml_with_env(yaml, |key| env::var(key).ok())
    }

    /// Parse configuration with an explicit environment lookup
    pub fn from_yaml_with_env<F>(yaml: &str, env_lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw: RawConfig = if yaml.trim().is_empty() {
            RawConfig::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        let lookup = |key: &str| env_lookup(key).filter(|v| !v.trim().is_empty());

        let provider = match raw.llm.provider.as_deref() {
            Some(name) => name
                .parse::<ProviderKind>()
                .map_err(|_| ConfigError::UnsupportedProvider(name.to_string()))?,
            None => ProviderKind::default(),
        };

        // Provider section values override the generic llm values
        let section = raw.provider_section(provider).cloned().unwrap_or_default();

        let reddit = RedditConfig {
            client_id: lookup("REDDIT_CLIENT_ID")
                .or(raw.reddit.client_id)
                .ok_or(ConfigError::MissingSetting("reddit.client_id"))?,
            client_secret: lookup("REDDIT_CLIENT_SECRET")
                .or(raw.reddit.client_secret)
                .ok_or(ConfigError::MissingSetting("reddit.client_secret"))?,
            username: lookup("REDDIT_USERNAME")
                .or(raw.reddit.username)
                .ok_or(ConfigError::MissingSetting("reddit.username"))?,
            password: lookup("REDDIT_PASSWORD")
                .or(raw.reddit.password)
                .ok_or(ConfigError::MissingSetting("reddit.password"))?,
            user_agent: raw.reddit.user_agent.unwrap_or_else(default_user_agent),
        };

        let api_key = lookup("LLM_API_KEY")
            .or(section.api_key)
            .or(raw.llm.api_key)
            .filter(|k| !k.trim().is_empty());
        if provider.requires_api_key() && api_key.is_none() {
            return Err(ConfigError::MissingApiKey(provider.to_string()));
        }

        let llm = LlmConfig {
            provider,
            model: section
                .model
                .or(raw.llm.model)
                .unwrap_or_else(|| provider.default_model().to_string()),
            api_key,
            host: section.host.or(raw.llm.host),
            timeout: Duration::from_secs(raw.llm.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
        };

        let legacy = raw.llm.confidence_threshold.unwrap_or(DEFAULT_THRESHOLD);
        let policy = DecisionPolicy::new(
            raw.llm.approve_threshold.unwrap_or(legacy),
            raw.llm.remove_threshold.unwrap_or(legacy),
        )?;

        let confidence_scale = match raw.llm.confidence_scale {
            Some(value) => value
                .parse::<ConfidenceScale>()
                .map_err(|_| ConfigError::UnknownValue {
                    kind: "confidence_scale",
                    value,
                })?,
            None => ConfidenceScale::default(),
        };

        Ok(Self {
            reddit,
            llm,
            policy,
            confidence_scale,
            queue_limit: raw.moderation.queue_limit.unwrap_or(DEFAULT_QUEUE_LIMIT),
        })
    }
}

/// Show only the last four characters of a secret
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), visible)
}

fn default_user_agent() -> String {
    format!("modqueue-moderator/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    reddit: RawReddit,
    #[serde(default)]
    llm: RawLlm,
    openai: Option<RawProviderSection>,
    anthropic: Option<RawProviderSection>,
    gemini: Option<RawProviderSection>,
    ollama: Option<RawProviderSection>,
    #[serde(default)]
    moderation: RawModeration,
}

impl RawConfig {
    fn provider_section(&self, provider: ProviderKind) -> Option<&RawProviderSection> {
        match provider {
            ProviderKind::OpenAi => self.openai.as_ref(),
            ProviderKind::Anthropic => self.anthropic.as_ref(),
            ProviderKind::Gemini => self.gemini.as_ref(),
            ProviderKind::Ollama => self.ollama.as_ref(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawReddit {
    client_id: Option<String>,
    client_secret: Option<String>,
    username: Option<String>,
    password: Option<String>,
    user_agent: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawLlm {
    provider: Option<String>,
    model: Option<String>,
    api_key: Option<String>,
    host: Option<String>,
    timeout_secs: Option<u64>,
    confidence_threshold: Option<f64>,
    approve_threshold: Option<f64>,
    remove_threshold: Option<f64>,
    confidence_scale: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawProviderSection {
    api_key: Option<String>,
    model: Option<String>,
    host: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawModeration {
    queue_limit: Option<u32>,
}
