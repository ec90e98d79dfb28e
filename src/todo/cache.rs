//! On-disk token cache
//!
//! Holds the OAuth session of every signed-in account so later runs can
//! authenticate silently. A missing or unreadable file is an empty cache.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;

/// File name of the cache inside the user's home directory.
pub const CACHE_FILE_NAME: &str = ".microsoft_todo_token_cache.json";

/// Access tokens expiring within this window are treated as expired.
const EXPIRY_SKEW_SECS: i64 = 300;

/// Default cache location (`~/.microsoft_todo_token_cache.json`).
pub fn default_cache_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CACHE_FILE_NAME)
}

/// Tokens and identity of one signed-in account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedAccount {
    pub home_account_id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl CachedAccount {
    /// The cached access token, if it stays valid for at least the skew window.
    pub fn valid_access_token(&self, now: DateTime<Utc>) -> Option<&str> {
        match (&self.access_token, self.expires_at) {
            (Some(token), Some(expires_at))
                if expires_at - Duration::seconds(EXPIRY_SKEW_SECS) > now =>
            {
                Some(token.as_str())
            }
            _ => None,
        }
    }

    /// Whether the cached tokens were granted for every scope in `scopes`.
    ///
    /// OIDC scopes never appear in granted scope lists and are skipped.
    pub fn covers(&self, scopes: &[&str]) -> bool {
        scopes
            .iter()
            .filter(|s| !matches!(**s, "openid" | "profile" | "offline_access"))
            .all(|s| {
                self.scopes
                    .iter()
                    .any(|granted| granted.eq_ignore_ascii_case(s) || granted.ends_with(&format!("/{}", s)))
            })
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TokenCache {
    #[serde(default)]
    accounts: BTreeMap<String, CachedAccount>,
    #[serde(skip)]
    changed: bool,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the cache from `path`.
    ///
    /// Absence or a deserialization failure yields an empty cache.
    pub fn load(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::new(),
            Err(e) => {
                warn!("Could not read token cache {}: {}", path.display(), e);
                return Self::new();
            }
        };

        match serde_json::from_str::<TokenCache>(&content) {
            Ok(cache) => cache,
            Err(e) => {
                warn!("Ignoring corrupt token cache {}: {}", path.display(), e);
                Self::new()
            }
        }
    }

    /// Write the cache to `path` and clear the change flag.
    pub fn save(&mut self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        restrict_permissions(path)?;
        self.changed = false;
        Ok(())
    }

    /// Persist only when something changed since load or the last save.
    pub fn save_if_changed(&mut self, path: &Path) -> Result<()> {
        if self.changed {
            self.save(path)?;
        }
        Ok(())
    }

    pub fn has_state_changed(&self) -> bool {
        self.changed
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn accounts(&self) -> impl Iterator<Item = &CachedAccount> {
        self.accounts.values()
    }

    /// First cached account, in stable key order.
    pub fn first_account(&self) -> Option<&CachedAccount> {
        self.accounts.values().next()
    }

    /// Insert or replace an account's session.
    pub fn upsert(&mut self, account: CachedAccount) {
        if self.accounts.get(&account.home_account_id) != Some(&account) {
            self.accounts
                .insert(account.home_account_id.clone(), account);
            self.changed = true;
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
