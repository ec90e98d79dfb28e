//! OAuth device-code authentication against the Microsoft identity platform
//!
//! Token acquisition runs the same sequence on every call:
//! 1. load the session cache from disk (missing or corrupt means empty)
//! 2. with a cached account, try silent acquisition: reuse an unexpired
//!    access token or redeem the refresh token
//! 3. otherwise start a device-code flow, print the sign-in instructions to
//!    stderr and wait for the user to finish
//! 4. persist the cache if it changed and hand back the access token

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, TimeDelta, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

use super::cache::{CachedAccount, TokenCache};
use super::graph::HTTP_TIMEOUT;

const DEVICE_CODE_GRANT: &str = "urn:ietf:params:oauth:grant-type:device_code";

/// Account key used when the provider returns no ID token.
const DEFAULT_ACCOUNT_ID: &str = "default";

/// Token endpoint response. Failures carry `error`/`error_description`
/// instead of an access token.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub scope: Option<String>,
    pub id_token: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl TokenResponse {
    /// Best available explanation of why no token was issued.
    pub fn failure_description(&self) -> String {
        self.error_description
            .clone()
            .or_else(|| self.error.clone())
            .unwrap_or_else(|| "no access token in response".to_string())
    }
}

/// Device authorization response from the `devicecode` endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceCode {
    pub user_code: Option<String>,
    #[serde(default)]
    pub device_code: String,
    pub verification_uri: Option<String>,
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
    #[serde(default = "default_interval")]
    pub interval: u64,
    pub message: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl DeviceCode {
    /// Sign-in instructions shown to the user.
    pub fn instructions(&self) -> String {
        if let Some(ref message) = self.message {
            return message.clone();
        }
        format!(
            "To sign in, use a web browser to open the page {} and enter the code {} to authenticate.",
            self.verification_uri.as_deref().unwrap_or("https://microsoft.com/devicelogin"),
            self.user_code.as_deref().unwrap_or_default()
        )
    }
}

fn default_expires_in() -> u64 {
    900
}

fn default_interval() -> u64 {
    5
}

/// Absolute expiry for a relative `expires_in`. Values chrono cannot
/// represent leave the token without an expiry, so it is never reused.
fn expiry_from_now(secs: i64) -> Option<DateTime<Utc>> {
    TimeDelta::try_seconds(secs).and_then(|delta| Utc::now().checked_add_signed(delta))
}

/// Claims read from the ID token to identify the signed-in account.
#[derive(Debug, Default, Deserialize)]
struct IdTokenClaims {
    oid: Option<String>,
    tid: Option<String>,
    preferred_username: Option<String>,
}

impl IdTokenClaims {
    /// Decode the payload segment of a JWT without verifying it.
    fn decode(id_token: &str) -> Option<Self> {
        let payload = id_token.split('.').nth(1)?;
        let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    fn home_account_id(&self) -> Option<String> {
        match (&self.oid, &self.tid) {
            (Some(oid), Some(tid)) => Some(format!("{}.{}", oid, tid)),
            (Some(oid), None) => Some(oid.clone()),
            _ => None,
        }
    }
}

/// Endpoints of an OAuth identity provider used by [`DeviceCodeAuth`].
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Redeem a refresh token for a new access token.
    async fn refresh(&self, refresh_token: &str, scopes: &[&str]) -> Result<TokenResponse>;

    /// Start a device-code flow.
    async fn request_device_code(&self, scopes: &[&str]) -> Result<DeviceCode>;

    /// Wait until the user completes (or abandons) the device-code flow.
    async fn poll_device_code(&self, flow: &DeviceCode) -> Result<TokenResponse>;
}

#[async_trait]
impl<P: IdentityProvider + ?Sized> IdentityProvider for Box<P> {
    async fn refresh(&self, refresh_token: &str, scopes: &[&str]) -> Result<TokenResponse> {
        (**self).refresh(refresh_token, scopes).await
    }

    async fn request_device_code(&self, scopes: &[&str]) -> Result<DeviceCode> {
        (**self).request_device_code(scopes).await
    }

    async fn poll_device_code(&self, flow: &DeviceCode) -> Result<TokenResponse> {
        (**self).poll_device_code(flow).await
    }
}

/// Microsoft identity platform v2.0 endpoints for one tenant.
pub struct MicrosoftIdentity {
    http: Client,
    authority: String,
    client_id: String,
}

impl MicrosoftIdentity {
    /// # Arguments
    /// * `authority` - e.g. `https://login.microsoftonline.com/consumers`
    /// * `client_id` - Application (client) ID of the app registration
    pub fn new(authority: impl Into<String>, client_id: impl Into<String>) -> Result<Self> {
        let http = Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            http,
            authority: authority.into(),
            client_id: client_id.into(),
        })
    }

    fn endpoint(&self, name: &str) -> String {
        format!(
            "{}/oauth2/v2.0/{}",
            self.authority.trim_end_matches('/'),
            name
        )
    }

    async fn post_token(&self, form: &[(&str, &str)]) -> Result<TokenResponse> {
        let response = self
            .http
            .post(self.endpoint("token"))
            .form(form)
            .send()
            .await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl IdentityProvider for MicrosoftIdentity {
    async fn refresh(&self, refresh_token: &str, scopes: &[&str]) -> Result<TokenResponse> {
        let scope = scopes.join(" ");
        self.post_token(&[
            ("grant_type", "refresh_token"),
            ("client_id", self.client_id.as_str()),
            ("refresh_token", refresh_token),
            ("scope", scope.as_str()),
        ])
        .await
    }

    async fn request_device_code(&self, scopes: &[&str]) -> Result<DeviceCode> {
        let scope = scopes.join(" ");
        let response = self
            .http
            .post(self.endpoint("devicecode"))
            .form(&[("client_id", self.client_id.as_str()), ("scope", scope.as_str())])
            .send()
            .await?;
        Ok(response.json().await?)
    }

    /// Poll the token endpoint every `interval` seconds until the user signs
    /// in, declines, or the provider's `expires_in` window closes.
    async fn poll_device_code(&self, flow: &DeviceCode) -> Result<TokenResponse> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(flow.expires_in);
        let mut interval = Duration::from_secs(flow.interval.max(1));

        loop {
            tokio::time::sleep(interval).await;

            let response = self
                .post_token(&[
                    ("grant_type", DEVICE_CODE_GRANT),
                    ("client_id", self.client_id.as_str()),
                    ("device_code", flow.device_code.as_str()),
                ])
                .await?;

            if response.access_token.is_some() {
                return Ok(response);
            }

            match response.error.as_deref() {
                Some("authorization_pending") => {}
                Some("slow_down") => interval += Duration::from_secs(5),
                _ => return Ok(response),
            }

            if tokio::time::Instant::now() >= deadline {
                return Ok(TokenResponse {
                    error: Some("expired_token".to_string()),
                    error_description: Some(
                        "The device code expired before sign-in completed.".to_string(),
                    ),
                    ..TokenResponse::default()
                });
            }
            debug!("Waiting for device-code sign-in");
        }
    }
}

/// Acquires access tokens through the cache, silent refresh and device-code flow.
pub struct DeviceCodeAuth<P> {
    provider: P,
    cache_path: PathBuf,
    scopes: Vec<String>,
}

impl<P: IdentityProvider> DeviceCodeAuth<P> {
    pub fn new(provider: P, cache_path: impl Into<PathBuf>, scopes: &[&str]) -> Self {
        Self {
            provider,
            cache_path: cache_path.into(),
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    fn scopes(&self) -> Vec<&str> {
        self.scopes.iter().map(String::as_str).collect()
    }

    /// Return a bearer token, signing in interactively when necessary.
    pub async fn acquire_token(&self) -> Result<String> {
        let mut cache = TokenCache::load(&self.cache_path);

        let token = match self.acquire_silent(&mut cache).await {
            Some(token) => token,
            None => self.acquire_interactive(&mut cache).await?,
        };

        cache.save_if_changed(&self.cache_path)?;
        Ok(token)
    }

    /// Silent acquisition for the first cached account; `None` means the
    /// interactive flow is needed.
    async fn acquire_silent(&self, cache: &mut TokenCache) -> Option<String> {
        let account = cache.first_account()?.clone();
        let scopes = self.scopes();

        if account.covers(&scopes)
            && let Some(token) = account.valid_access_token(Utc::now())
        {
            debug!("Using cached access token");
            return Some(token.to_string());
        }

        let refresh_token = account.refresh_token.as_deref()?;
        match self.provider.refresh(refresh_token, &scopes).await {
            Ok(response) => match response.access_token.clone() {
                Some(access_token) => {
                    cache.upsert(self.account_from_response(&response, Some(&account)));
                    debug!("Refreshed access token silently");
                    Some(access_token)
                }
                None => {
                    warn!(
                        "Silent token refresh failed: {}",
                        response.failure_description()
                    );
                    None
                }
            },
            Err(e) => {
                warn!("Silent token refresh failed: {}", e);
                None
            }
        }
    }

    async fn acquire_interactive(&self, cache: &mut TokenCache) -> Result<String> {
        let scopes = self.scopes();
        let flow = self.provider.request_device_code(&scopes).await?;

        if flow.user_code.is_none() {
            return Err(Error::Authentication {
                description: flow
                    .error_description
                    .clone()
                    .or_else(|| flow.error.clone())
                    .unwrap_or_else(|| "device flow did not return a user code".to_string()),
            });
        }

        // Stdout carries the MCP transport; the user reads stderr.
        eprintln!("{}", flow.instructions());

        let response = self.provider.poll_device_code(&flow).await?;
        let Some(access_token) = response.access_token.clone() else {
            return Err(Error::Authentication {
                description: response.failure_description(),
            });
        };

        let account = self.account_from_response(&response, None);
        info!(
            "Authenticated as {}",
            account.username.as_deref().unwrap_or(&account.home_account_id)
        );
        cache.upsert(account);
        Ok(access_token)
    }

    /// Merge a successful token response into a cache entry.
    fn account_from_response(
        &self,
        response: &TokenResponse,
        previous: Option<&CachedAccount>,
    ) -> CachedAccount {
        let claims = response
            .id_token
            .as_deref()
            .and_then(IdTokenClaims::decode)
            .unwrap_or_default();

        let home_account_id = previous
            .map(|p| p.home_account_id.clone())
            .or_else(|| claims.home_account_id())
            .unwrap_or_else(|| DEFAULT_ACCOUNT_ID.to_string());

        let scopes = match response.scope {
            Some(ref granted) => granted.split_whitespace().map(str::to_string).collect(),
            None => self.scopes.clone(),
        };

        CachedAccount {
            home_account_id,
            username: claims
                .preferred_username
                .or_else(|| previous.and_then(|p| p.username.clone())),
            refresh_token: response
                .refresh_token
                .clone()
                .or_else(|| previous.and_then(|p| p.refresh_token.clone())),
            access_token: response.access_token.clone(),
            expires_at: response.expires_in.and_then(expiry_from_now),
            scopes,
        }
    }
}
