//! Modqueue MCP Server implementation
//!
//! Every tool reports failures as an MCP error result; nothing here can take
//! the server down.

use std::env;
use std::sync::Arc;

use anyhow::{Context, Result};
use modqueue_moderator::adapters::{LlmClient, RedditClient};
use modqueue_moderator::app::{ModerationService, ModerationSettings};
use modqueue_moderator::config::{AppConfig, DEFAULT_CONFIG_PATH, DEFAULT_RULES_PATH};
use modqueue_moderator::domain::entities::{
    DecisionRecord, ItemTypeFilter, ModerationItem, RuleSet,
};
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{
    handler::server::tool::ToolRouter,
    model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler,
};
use schemars::JsonSchema;
use serde::Deserialize;

type Service = ModerationService<LlmClient, RedditClient>;

/// Modqueue MCP Server
///
/// Wraps one moderation service bound to a single subreddit.
#[derive(Clone)]
pub struct ModqueueServer {
    service: Arc<Service>,
    subreddit: String,
    tool_router: ToolRouter<Self>,
}

impl ModqueueServer {
    pub fn from_env() -> Result<Self> {
        let subreddit =
            env::var("MODERATOR_SUBREDDIT").context("MODERATOR_SUBREDDIT must be set")?;
        let config_path =
            env::var("MODERATOR_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let rules_path =
            env::var("MODERATOR_RULES").unwrap_or_else(|_| DEFAULT_RULES_PATH.to_string());

        let config = AppConfig::load(&config_path)
            .with_context(|| format!("loading config from {}", config_path))?;
        let rules = RuleSet::load(&rules_path)
            .with_context(|| format!("loading rules from {}", rules_path))?;

        let provider = LlmClient::from_config(&config.llm)?;
        let platform = RedditClient::new(config.reddit.clone(), subreddit.clone(), config.queue_limit)?;

        // Dry run is chosen per tool call
        let settings = ModerationSettings {
            policy: config.policy,
            confidence_scale: config.confidence_scale,
            dry_run: true,
        };

        tracing::info!(subreddit = %subreddit, rules = rules.len(), "Moderation service ready");

        Ok(Self {
            service: Arc::new(ModerationService::new(
                Arc::new(provider),
                Arc::new(platform),
                Arc::new(rules),
                settings,
            )),
            subreddit,
            tool_router: Self::tool_router(),
        })
    }

    async fn process(&self, item_id: &str, dry_run: bool) -> CallToolResult {
        let item = match self.service.find_item(item_id).await {
            Ok(item) => item,
            Err(e) => return CallToolResult::error(vec![Content::text(e.to_string())]),
        };
        let record = self.service.process_with(&item, dry_run).await;
        CallToolResult::success(vec![Content::text(format_record(&item, &record))])
    }
}

// --- Tool Parameter Types ---

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ModqueueParams {
    /// Restrict to "submissions" or "comments" (default: all)
    #[serde(default)]
    pub item_type: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ItemParams {
    /// Item id, with or without type prefix (e.g. "abc123" or "t3_abc123")
    pub item_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ModerateParams {
    /// Item id, with or without type prefix
    pub item_id: String,
    /// Only report the decision (default: true). Set false to apply it.
    #[serde(default = "default_dry_run")]
    pub dry_run: bool,
}

fn default_dry_run() -> bool {
    true
}

#[tool_router]
impl ModqueueServer {
    #[tool(description = "List the subreddit rules the moderator enforces.")]
    async fn rules(&self) -> Result<CallToolResult, McpError> {
        Ok(CallToolResult::success(vec![Content::text(format_rules(
            self.service.rules(),
        ))]))
    }

    #[tool(description = "List items waiting in the moderation queue. Optionally filter by item_type: submissions or comments.")]
    async fn modqueue(&self, params: Parameters<ModqueueParams>) -> Result<CallToolResult, McpError> {
        let filter = match params.0.item_type.as_deref() {
            Some(value) => match value.parse::<ItemTypeFilter>() {
                Ok(filter) => filter,
                Err(e) => return Ok(CallToolResult::error(vec![Content::text(e)])),
            },
            None => ItemTypeFilter::All,
        };

        match self.service.queue(filter).await {
            Ok(items) => Ok(CallToolResult::success(vec![Content::text(format_queue(
                &self.subreddit,
                &items,
            ))])),
            Err(e) => Ok(CallToolResult::error(vec![Content::text(e.to_string())])),
        }
    }

    #[tool(description = "Evaluate one queued item against the rules and report the decision. Never changes anything on Reddit.")]
    async fn evaluate(&self, params: Parameters<ItemParams>) -> Result<CallToolResult, McpError> {
        Ok(self.process(&params.0.item_id, true).await)
    }

    #[tool(description = "Evaluate one item and apply the decision (approve, or remove and notify the author). Dry run by default; pass dry_run=false to act.")]
    async fn moderate(&self, params: Parameters<ModerateParams>) -> Result<CallToolResult, McpError> {
        let ModerateParams { item_id, dry_run } = params.0;
        tracing::info!(item_id = %item_id, dry_run, "moderate tool called");
        Ok(self.process(&item_id, dry_run).await)
    }
}

#[tool_handler]
impl ServerHandler for ModqueueServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "modqueue".into(),
                title: Some("Modqueue Moderator MCP Server".into()),
                version: env!("CARGO_PKG_VERSION").into(),
                icons: None,
                website_url: None,
            },
            instructions: Some(format!(
                r#"LLM-assisted moderation for r/{}

WORKFLOW:
1. 'rules' - See the rules being enforced
2. 'modqueue' - List items awaiting review
3. 'evaluate' - See what the moderator would do with one item
4. 'moderate' - Apply the decision (pass dry_run=false)

Removals only happen when the model names a configured rule with enough
confidence; everything uncertain is left for a human."#,
                self.subreddit
            )),
        }
    }
}

// --- Output Formatting ---

fn format_rules(rules: &RuleSet) -> String {
    rules
        .iter()
        .map(|rule| {
            let mut text = format!("{} [{}]", rule, rule.notification_method);
            if !rule.explanation.is_empty() {
                text.push_str(&format!("\n  {}", rule.explanation));
            }
            text
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_queue(subreddit: &str, items: &[ModerationItem]) -> String {
    if items.is_empty() {
        return format!("The r/{} modqueue is empty.", subreddit);
    }
    let lines = items
        .iter()
        .map(|item| {
            format!(
                "- {} ({}) by {}: {}",
                item.fullname,
                item.item_type,
                item.author.as_deref().unwrap_or("[deleted]"),
                item.label()
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!("{} item(s) in r/{} modqueue:\n{}", items.len(), subreddit, lines)
}

fn format_record(item: &ModerationItem, record: &DecisionRecord) -> String {
    let detail = serde_json::to_string_pretty(record)
        .unwrap_or_else(|e| format!("(could not serialize record: {})", e));
    format!(
        "{} {}: {}\n\n{}",
        item.item_type,
        item.fullname,
        record.decision.summary(),
        detail
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use modqueue_moderator::domain::entities::{
        Confidence, Decision, ItemType, SideEffects, Verdict,
    };

    fn item() -> ModerationItem {
        ModerationItem {
            id: "abc".to_string(),
            fullname: "t3_abc".to_string(),
            item_type: ItemType::Submission,
            title: Some("Hello".to_string()),
            body_text: String::new(),
            author: None,
            subreddit: "rust".to_string(),
            url: None,
            domain: None,
            link_title: None,
        }
    }

    #[test]
    fn test_modqueue_params_deserialize() {
        let params: ModqueueParams = serde_json::from_str(r#"{}"#).unwrap();
        assert!(params.item_type.is_none());

        let params: ModqueueParams =
            serde_json::from_str(r#"{"item_type": "comments"}"#).unwrap();
        assert_eq!(params.item_type.as_deref(), Some("comments"));
    }

    #[test]
    fn test_moderate_params_default_to_dry_run() {
        let params: ModerateParams = serde_json::from_str(r#"{"item_id": "t3_abc"}"#).unwrap();
        assert_eq!(params.item_id, "t3_abc");
        assert!(params.dry_run);

        let params: ModerateParams =
            serde_json::from_str(r#"{"item_id": "abc", "dry_run": false}"#).unwrap();
        assert!(!params.dry_run);
    }

    #[test]
    fn test_item_params_require_id() {
        assert!(serde_json::from_str::<ItemParams>(r#"{}"#).is_err());
    }

    #[test]
    fn test_format_rules() {
        let rules = RuleSet::from_yaml_str(
            "rules:\n  - number: 1\n    title: No spam\n    explanation: Keep it on topic\n    response: Removed\n",
        )
        .unwrap();
        assert_eq!(
            format_rules(&rules),
            "Rule 1: No spam [public]\n  Keep it on topic"
        );
    }

    #[test]
    fn test_format_queue() {
        assert_eq!(format_queue("rust", &[]), "The r/rust modqueue is empty.");

        let text = format_queue("rust", &[item()]);
        assert!(text.starts_with("1 item(s) in r/rust modqueue:"));
        assert!(text.contains("- t3_abc (submission) by [deleted]: Hello"));
    }

    #[test]
    fn test_format_record() {
        let record = DecisionRecord {
            item_id: "abc".to_string(),
            item_type: ItemType::Submission,
            verdict: Some(Verdict::parse_failure()),
            confidence: Confidence::ZERO,
            decision: Decision::no_action("Confidence 0.00 below approve threshold 0.80"),
            side_effects: SideEffects::DryRun,
            decided_at: Utc::now(),
        };
        let text = format_record(&item(), &record);
        assert!(text.starts_with("submission t3_abc: No action taken"));
        assert!(text.contains("\"action\": \"no_action\""));
        assert!(text.contains("\"status\": \"dry_run\""));
    }
}
