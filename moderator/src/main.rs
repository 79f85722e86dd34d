//! Modqueue moderator CLI
//!
//! Runs one pass over a subreddit's moderation queue.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use modqueue_moderator::adapters::{LlmClient, RedditClient};
use modqueue_moderator::app::{ModerationService, ModerationSettings};
use modqueue_moderator::config::{AppConfig, DEFAULT_CONFIG_PATH, DEFAULT_RULES_PATH};
use modqueue_moderator::domain::entities::{ItemTypeFilter, NotificationMethod, RuleSet};

#[derive(Debug, Parser)]
#[command(name = "modqueue-moderator", version, about = "LLM-assisted subreddit moderation")]
struct Cli {
    /// Subreddit to moderate (without the r/ prefix)
    #[arg(long, env = "MODERATOR_SUBREDDIT")]
    subreddit: String,

    /// Decide and log, but do not approve, remove or notify
    #[arg(long)]
    dry_run: bool,

    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[arg(long, default_value = DEFAULT_RULES_PATH)]
    rules: PathBuf,

    /// Which queued items to process: all, submissions or comments
    #[arg(long = "type", default_value = "all")]
    item_type: ItemTypeFilter,

    /// Send every removal notice through this channel instead of the rule's own
    #[arg(long)]
    notification: Option<NotificationMethod>,

    /// Maximum number of queued items to fetch (overrides the config file)
    #[arg(long)]
    limit: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,modqueue_moderator=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = AppConfig::load(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    let rules = RuleSet::load(&cli.rules)
        .with_context(|| format!("loading rules from {}", cli.rules.display()))?;

    let policy = config.policy.with_channel_override(cli.notification);
    let settings = ModerationSettings {
        policy,
        confidence_scale: config.confidence_scale,
        dry_run: cli.dry_run,
    };
    let queue_limit = cli.limit.unwrap_or(config.queue_limit);

    tracing::info!(
        subreddit = %cli.subreddit,
        mode = if cli.dry_run { "dry run" } else { "live" },
        filter = %cli.item_type,
        rules = rules.len(),
        approve_threshold = policy.approve_threshold(),
        remove_threshold = policy.remove_threshold(),
        confidence_scale = %config.confidence_scale,
        notification_override = ?cli.notification,
        queue_limit,
        "Starting moderation run"
    );

    let provider = LlmClient::from_config(&config.llm).context("configuring LLM provider")?;
    let platform = RedditClient::new(config.reddit.clone(), cli.subreddit.clone(), queue_limit)
        .context("creating Reddit client")?;

    let service = ModerationService::new(
        Arc::new(provider),
        Arc::new(platform),
        Arc::new(rules),
        settings,
    );

    let summary = service
        .run(cli.item_type)
        .await
        .with_context(|| format!("moderating r/{}", cli.subreddit))?;

    println!("r/{}: {}", cli.subreddit, summary);
    Ok(())
}
