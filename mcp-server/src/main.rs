//! Modqueue MCP Server
//!
//! Exposes the moderation engine as MCP tools over stdio so an assistant can
//! inspect a subreddit's queue and moderate individual items. Configured via
//! environment variables:
//! - `MODERATOR_SUBREDDIT`: subreddit to moderate (required)
//! - `MODERATOR_CONFIG`: config file path (default `config.yaml`)
//! - `MODERATOR_RULES`: rules file path (default `rules.yaml`)

mod server;

use anyhow::Result;
use rmcp::ServiceExt;
use server::ModqueueServer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging to stderr (stdout is used for MCP protocol)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting modqueue MCP server");

    let server = ModqueueServer::from_env()?;

    // Serve over stdio - pass as tuple (stdin, stdout)
    let transport = (tokio::io::stdin(), tokio::io::stdout());
    let service = server.serve(transport).await?;

    service.waiting().await?;

    Ok(())
}
