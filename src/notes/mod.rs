//! Apple Notes adapter
//!
//! Read-only access to the Notes application through AppleScript:
//! - `script`: AppleScript sources for each query
//! - `bridge`: runs a script via `osascript` with a timeout
//! - `parse`: turns the flat text output into display strings

pub mod bridge;
pub mod parse;
pub mod script;

use mcp_attr::server::{McpServer, mcp_server};
use mcp_attr::{Result as McpResult, bail_public};
use tracing::info;

pub use bridge::Osascript;
pub use parse::NoteSummary;

/// MCP Server handler for Apple Notes
pub struct AppleNotesHandler {
    bridge: Osascript,
}

impl AppleNotesHandler {
    /// Create a new Apple Notes handler
    ///
    /// # Arguments
    /// * `bridge` - Scripting bridge used for every query
    ///
    /// # Returns
    /// A handler ready to be served with `serve_stdio`
    ///
    /// # Example
    /// ```no_run
    /// use bridge_mcp::notes::{AppleNotesHandler, Osascript};
    /// use std::time::Duration;
    ///
    /// let bridge = Osascript::default().with_timeout(Duration::from_secs(10));
    /// let handler = AppleNotesHandler::new(bridge);
    /// ```
    pub fn new(bridge: Osascript) -> Self {
        Self { bridge }
    }

    /// Run a script, surfacing bridge failures as public MCP errors.
    async fn run_script(&self, script: &str) -> McpResult<String> {
        match self.bridge.run(script).await {
            Ok(raw) => Ok(raw),
            Err(e) => {
                bail_public!(_, "{}", e);
            }
        }
    }

    /// List folder names, one `- name` line each, or `No folders found.`
    pub async fn handle_get_folders(&self) -> McpResult<String> {
        info!("Listing folders");
        let raw = self.run_script(&script::folders_script()).await?;
        Ok(parse::parse_folders(&raw))
    }

    /// List notes, optionally limited to one folder.
    ///
    /// # Arguments
    /// * `folder` - Folder name; `None` or an empty name lists every folder
    ///
    /// # Returns
    /// One `- title  [folder: …, modified: …]` line per note, with locked
    /// notes marked, or `No notes found.`
    pub async fn handle_get_notes(&self, folder: Option<String>) -> McpResult<String> {
        // An empty folder name means "all folders".
        let folder = folder.filter(|f| !f.is_empty());
        match folder.as_deref() {
            Some(name) => info!("Listing notes in folder '{}'", name),
            None => info!("Listing notes"),
        }
        let raw = self.run_script(&script::notes_script(folder.as_deref())).await?;
        Ok(parse::parse_notes(&raw))
    }

    /// Read one note as Markdown. A locked or missing note yields a
    /// "not found or is password-protected" message instead of content.
    pub async fn handle_get_note_content(&self, title: String) -> McpResult<String> {
        info!("Reading note: {}", title);
        let raw = self
            .run_script(&script::note_content_script(&title))
            .await?;
        Ok(parse::parse_note_content(&raw, &title))
    }
}

impl Default for AppleNotesHandler {
    fn default() -> Self {
        Self::new(Osascript::default())
    }
}

/// Read-only access to Apple Notes on this Mac.
///
/// List folders, list notes (optionally within one folder) and read a note's
/// content as Markdown. Password-protected notes are listed but never read.
#[mcp_server]
impl McpServer for AppleNotesHandler {
    /// Get a list of all folders in Apple Notes.
    #[tool]
    async fn get_folders(&self) -> McpResult<String> {
        self.handle_get_folders().await
    }

    /// Get a list of notes with titles, folder, and modification dates.
    #[tool]
    async fn get_notes(
        &self,
        /// Folder name to filter by. Lists all notes if not provided (optional)
        folder: Option<String>,
    ) -> McpResult<String> {
        self.handle_get_notes(folder).await
    }

    /// Read the full content of a specific note by its title.
    /// Returns Markdown converted from the note's HTML. Refuses to read password-protected notes.
    #[tool]
    async fn get_note_content(
        &self,
        /// The exact title of the note to read
        title: String,
    ) -> McpResult<String> {
        self.handle_get_note_content(title).await
    }
}
