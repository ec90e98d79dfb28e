//! Settings for the To Do adapter, read from the environment once at startup.

use std::path::PathBuf;

use crate::error::{Error, Result};

use super::cache::default_cache_path;

pub const CLIENT_ID_VAR: &str = "MS_TODO_CLIENT_ID";
pub const TENANT_ID_VAR: &str = "MS_TODO_TENANT_ID";

/// Tenant used when none is configured: personal Microsoft accounts.
pub const DEFAULT_TENANT: &str = "consumers";
pub const AUTHORITY_HOST: &str = "https://login.microsoftonline.com";
pub const GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

/// Resource scopes requested for every token.
pub const SCOPES: &[&str] = &["Tasks.Read", "offline_access", "openid", "profile"];

#[derive(Debug, Clone)]
pub struct TodoConfig {
    /// Application (client) id; checked on each call rather than at startup.
    pub client_id: Option<String>,
    pub tenant_id: String,
    pub authority_host: String,
    pub graph_base_url: String,
    pub cache_path: PathBuf,
}

impl Default for TodoConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            tenant_id: DEFAULT_TENANT.to_string(),
            authority_host: AUTHORITY_HOST.to_string(),
            graph_base_url: GRAPH_BASE_URL.to_string(),
            cache_path: default_cache_path(),
        }
    }
}

impl TodoConfig {
    /// Build the configuration from `MS_TODO_CLIENT_ID` and `MS_TODO_TENANT_ID`.
    ///
    /// Empty values count as unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        Self {
            client_id: non_empty(CLIENT_ID_VAR),
            tenant_id: non_empty(TENANT_ID_VAR).unwrap_or_else(|| DEFAULT_TENANT.to_string()),
            ..Self::default()
        }
    }

    pub fn with_cache_path(mut self, cache_path: impl Into<PathBuf>) -> Self {
        self.cache_path = cache_path.into();
        self
    }

    pub fn require_client_id(&self) -> Result<&str> {
        self.client_id
            .as_deref()
            .ok_or(Error::MissingEnv { var: CLIENT_ID_VAR })
    }

    /// `https://login.microsoftonline.com/{tenant}`
    pub fn authority(&self) -> String {
        format!(
            "{}/{}",
            self.authority_host.trim_end_matches('/'),
            self.tenant_id
        )
    }
}
