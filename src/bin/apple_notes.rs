//! Apple Notes MCP Server - Main Entry Point
//!
//! Serves the Apple Notes tools over MCP stdio.
//! The actual implementation is in the `bridge_mcp` library.

use anyhow::Result;
use bridge_mcp::logging;
use bridge_mcp::notes::{AppleNotesHandler, Osascript};
use clap::Parser;
use mcp_attr::server::serve_stdio;
use tracing::info;

/// Apple Notes MCP Server - read Apple Notes via Model Context Protocol
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Program used to run AppleScript
    #[arg(long, default_value = "osascript")]
    osascript: String,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(&args.log_level);

    info!("Starting Apple Notes MCP server");
    let handler = AppleNotesHandler::new(Osascript::new(args.osascript));
    serve_stdio(handler).await?;
    Ok(())
}
