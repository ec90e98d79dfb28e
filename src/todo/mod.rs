//! Microsoft To Do adapter
//!
//! Read-only access to Microsoft To Do through Microsoft Graph:
//! - `config`: client/tenant settings taken from the environment
//! - `auth`: device-code sign-in with an on-disk session cache
//! - `cache`: the session cache file
//! - `graph`: authenticated GET requests against the To Do endpoints
//! - `model`: typed Graph payloads
//! - `formatting`: plain-text rendering of those payloads

pub mod auth;
pub mod cache;
pub mod config;
pub mod formatting;
pub mod graph;
pub mod model;

use mcp_attr::Result as McpResult;
use mcp_attr::server::{McpServer, mcp_server};
use tracing::{error, info, warn};

use crate::error::Result;

pub use auth::{DeviceCodeAuth, IdentityProvider, MicrosoftIdentity};
pub use cache::TokenCache;
pub use config::TodoConfig;
pub use graph::GraphClient;

/// Builds the identity provider used for one tool call.
///
/// Called on every call so configuration problems (such as a missing client
/// id) surface as that call's error instead of failing server startup.
pub type ProviderFactory =
    Box<dyn Fn(&TodoConfig) -> Result<Box<dyn IdentityProvider>> + Send + Sync>;

/// MCP Server handler for Microsoft To Do
///
/// Every tool signs in (cache, silent refresh or device code) before its
/// Graph request and reports failures as an `Error fetching …` string.
pub struct TodoHandler {
    config: TodoConfig,
    graph: GraphClient,
    provider: ProviderFactory,
}

impl TodoHandler {
    /// Create a handler that signs in against the Microsoft identity platform.
    ///
    /// # Arguments
    /// * `config` - Client and tenant IDs, Graph base URL and cache location
    ///
    /// # Returns
    /// The handler, or an error if the HTTP client cannot be built.
    /// A missing client ID is not an error here; each tool call reports it.
    pub fn new(config: TodoConfig) -> Result<Self> {
        Self::with_provider(config, microsoft_identity)
    }

    /// Create a handler whose identity provider comes from `provider`.
    ///
    /// # Arguments
    /// * `config` - Client and tenant IDs, Graph base URL and cache location
    /// * `provider` - Builds the provider for each call from `config`
    ///
    /// # Returns
    /// The handler, or an error if the Graph HTTP client cannot be built.
    ///
    /// # Example
    /// ```no_run
    /// use bridge_mcp::todo::{IdentityProvider, MicrosoftIdentity, TodoConfig, TodoHandler};
    ///
    /// let config = TodoConfig::from_env();
    /// let handler = TodoHandler::with_provider(config, |config| {
    ///     let identity = MicrosoftIdentity::new(config.authority(), "my-client-id")?;
    ///     Ok(Box::new(identity) as Box<dyn IdentityProvider>)
    /// })?;
    /// # Ok::<(), bridge_mcp::Error>(())
    /// ```
    pub fn with_provider<F>(config: TodoConfig, provider: F) -> Result<Self>
    where
        F: Fn(&TodoConfig) -> Result<Box<dyn IdentityProvider>> + Send + Sync + 'static,
    {
        let graph = GraphClient::new(config.graph_base_url.clone())?;
        Ok(Self {
            config,
            graph,
            provider: Box::new(provider),
        })
    }

    /// Run the full authentication sequence for one call.
    async fn access_token(&self) -> Result<String> {
        let identity = (self.provider)(&self.config)?;
        DeviceCodeAuth::new(identity, &self.config.cache_path, config::SCOPES)
            .acquire_token()
            .await
    }

    /// List every task list as `- name (id: id)`.
    ///
    /// # Returns
    /// The formatted lists, `No task lists found.`, or
    /// `Error fetching task lists: …` on any failure.
    pub async fn handle_get_task_lists(&self) -> String {
        info!("Fetching task lists");
        match self.fetch_task_lists().await {
            Ok(text) => text,
            Err(e) => {
                error!("Failed to fetch task lists: {}", e);
                format!("Error fetching task lists: {}", e)
            }
        }
    }

    /// List the tasks of one list.
    ///
    /// # Arguments
    /// * `list_id` - ID from `get_task_lists`
    /// * `include_completed` - Keep tasks whose status is `completed`
    ///
    /// # Returns
    /// One line per task, `No tasks found.`, or `Error fetching tasks: …`.
    pub async fn handle_get_tasks(&self, list_id: String, include_completed: bool) -> String {
        info!("Fetching tasks for list {}", list_id);
        match self.fetch_tasks(&list_id, include_completed).await {
            Ok(text) => text,
            Err(e) => {
                error!("Failed to fetch tasks: {}", e);
                format!("Error fetching tasks: {}", e)
            }
        }
    }

    /// Render one task with its body and checklist.
    ///
    /// A checklist that cannot be fetched is logged and left out; only a
    /// failure on the task itself yields `Error fetching task: …`.
    pub async fn handle_get_task_detail(&self, list_id: String, task_id: String) -> String {
        info!("Fetching task {} in list {}", task_id, list_id);
        match self.fetch_task_detail(&list_id, &task_id).await {
            Ok(text) => text,
            Err(e) => {
                error!("Failed to fetch task: {}", e);
                format!("Error fetching task: {}", e)
            }
        }
    }

    async fn fetch_task_lists(&self) -> Result<String> {
        let token = self.access_token().await?;
        let lists = self.graph.task_lists(&token).await?;
        Ok(formatting::format_task_lists(&lists))
    }

    async fn fetch_tasks(&self, list_id: &str, include_completed: bool) -> Result<String> {
        let token = self.access_token().await?;
        let tasks = self.graph.tasks(&token, list_id).await?;
        Ok(formatting::format_tasks(&tasks, include_completed))
    }

    async fn fetch_task_detail(&self, list_id: &str, task_id: &str) -> Result<String> {
        let token = self.access_token().await?;
        let task = self.graph.task(&token, list_id, task_id).await?;
        let checklist = match self.graph.checklist_items(&token, list_id, task_id).await {
            Ok(items) => items,
            Err(e) => {
                warn!("Checklist unavailable for task {}: {}", task_id, e);
                Vec::new()
            }
        };
        Ok(formatting::format_task_detail(&task, &checklist))
    }
}

/// Default provider factory: the Microsoft identity platform for the
/// configured tenant.
fn microsoft_identity(config: &TodoConfig) -> Result<Box<dyn IdentityProvider>> {
    let client_id = config.require_client_id()?;
    Ok(Box::new(MicrosoftIdentity::new(config.authority(), client_id)?))
}

/// Read-only access to Microsoft To Do.
///
/// The first call prints a device-code sign-in prompt on the server's stderr;
/// later calls reuse the cached session.
/// Use get_task_lists to discover list IDs, get_tasks to browse a list and
/// get_task_detail for one task with its checklist.
#[mcp_server]
impl McpServer for TodoHandler {
    /// Get all task lists with their IDs.
    #[tool]
    async fn get_task_lists(&self) -> McpResult<String> {
        Ok(self.handle_get_task_lists().await)
    }

    /// Get the tasks in a task list. Completed tasks are hidden unless requested.
    #[tool]
    async fn get_tasks(
        &self,
        /// ID of the task list (from get_task_lists)
        list_id: String,
        /// Include completed tasks (optional, default false)
        include_completed: Option<bool>,
    ) -> McpResult<String> {
        Ok(self
            .handle_get_tasks(list_id, include_completed.unwrap_or(false))
            .await)
    }

    /// Get full details of one task, including notes and checklist items.
    #[tool]
    async fn get_task_detail(
        &self,
        /// ID of the task list
        list_id: String,
        /// ID of the task (from get_tasks)
        task_id: String,
    ) -> McpResult<String> {
        Ok(self.handle_get_task_detail(list_id, task_id).await)
    }
}
