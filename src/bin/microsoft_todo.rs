//! Microsoft To Do MCP Server - Main Entry Point
//!
//! Serves the Microsoft To Do tools over MCP stdio.
//! The actual implementation is in the `bridge_mcp` library.

use std::path::PathBuf;

use anyhow::Result;
use bridge_mcp::logging;
use bridge_mcp::todo::{TodoConfig, TodoHandler};
use clap::Parser;
use mcp_attr::server::serve_stdio;
use tracing::{info, warn};

/// Microsoft To Do MCP Server - read Microsoft To Do via Model Context Protocol
///
/// Requires MS_TODO_CLIENT_ID; MS_TODO_TENANT_ID defaults to "consumers".
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Token cache file (default: ~/.microsoft_todo_token_cache.json)
    #[arg(long)]
    cache_file: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    // A missing .env file is fine; the environment may already be set.
    dotenvy::dotenv().ok();
    logging::init(&args.log_level);

    let mut config = TodoConfig::from_env();
    if let Some(path) = args.cache_file {
        config = config.with_cache_path(path);
    }
    if config.client_id.is_none() {
        warn!("MS_TODO_CLIENT_ID is not set; every tool call will fail until it is");
    }

    info!("Starting Microsoft To Do MCP server");
    let handler = TodoHandler::new(config)?;
    serve_stdio(handler).await?;
    Ok(())
}
