//! Bridge MCP Server Library
//!
//! This library provides two Model Context Protocol (MCP) servers that give an
//! assistant read-only access to personal productivity tools:
//! - **Apple Notes**: `notes::AppleNotesHandler` drives the Notes app through `osascript`
//! - **Microsoft To Do**: `todo::TodoHandler` reads tasks from Microsoft Graph,
//!   signing in with the OAuth device-code flow
//!
//! # Architecture
//!
//! Both adapters follow the same 3-layer shape:
//! - **MCP Layer**: the handler's `#[tool]` methods
//! - **Formatting Layer**: pure functions turning raw output into display text
//! - **Transport Layer**: one external call per request (a script run or an HTTP GET)
//!
//! # Example
//!
//! ```no_run
//! use bridge_mcp::notes::AppleNotesHandler;
//! use mcp_attr::server::serve_stdio;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     serve_stdio(AppleNotesHandler::default()).await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;
pub mod notes;
pub mod todo;

pub use error::{Error, Result};
pub use notes::AppleNotesHandler;
pub use todo::TodoHandler;
