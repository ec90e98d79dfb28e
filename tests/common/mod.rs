//! Common test utilities for integration tests

#![allow(dead_code)]

pub mod http;

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use bridge_mcp::todo::IdentityProvider;
use bridge_mcp::todo::auth::{DeviceCode, TokenResponse};
use bridge_mcp::{Error, Result};

/// In-memory identity provider recording how often each endpoint was hit
pub struct FakeProvider {
    pub refresh_response: Mutex<Option<TokenResponse>>,
    pub device_code: DeviceCode,
    pub poll_response: TokenResponse,
    pub refresh_calls: AtomicUsize,
    pub device_code_calls: AtomicUsize,
    pub poll_calls: AtomicUsize,
}

impl FakeProvider {
    /// A provider whose device flow succeeds and whose refresh fails
    pub fn new() -> Self {
        Self {
            refresh_response: Mutex::new(None),
            device_code: device_code("ABCD-1234"),
            poll_response: token_response("interactive-token", "interactive-refresh"),
            refresh_calls: AtomicUsize::new(0),
            device_code_calls: AtomicUsize::new(0),
            poll_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_refresh(self, response: TokenResponse) -> Self {
        *self.refresh_response.lock().unwrap() = Some(response);
        self
    }

    pub fn refreshes(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn device_flows(&self) -> usize {
        self.device_code_calls.load(Ordering::SeqCst)
    }

    pub fn polls(&self) -> usize {
        self.poll_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    async fn refresh(&self, _refresh_token: &str, _scopes: &[&str]) -> Result<TokenResponse> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        match self.refresh_response.lock().unwrap().clone() {
            Some(response) => Ok(response),
            None => Err(Error::HttpStatus {
                status: 400,
                body: "invalid_grant".to_string(),
            }),
        }
    }

    async fn request_device_code(&self, _scopes: &[&str]) -> Result<DeviceCode> {
        self.device_code_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.device_code.clone())
    }

    async fn poll_device_code(&self, _flow: &DeviceCode) -> Result<TokenResponse> {
        self.poll_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.poll_response.clone())
    }
}

pub fn device_code(user_code: &str) -> DeviceCode {
    DeviceCode {
        user_code: Some(user_code.to_string()),
        device_code: "device-secret".to_string(),
        verification_uri: Some("https://microsoft.com/devicelogin".to_string()),
        expires_in: 900,
        interval: 5,
        ..DeviceCode::default()
    }
}

/// A successful token response carrying an ID token for `me@outlook.com`
pub fn token_response(access: &str, refresh: &str) -> TokenResponse {
    let claims = URL_SAFE_NO_PAD.encode(
        r#"{"oid":"user-oid","tid":"tenant-id","preferred_username":"me@outlook.com"}"#,
    );
    TokenResponse {
        access_token: Some(access.to_string()),
        refresh_token: Some(refresh.to_string()),
        expires_in: Some(3600),
        scope: Some("Tasks.Read".to_string()),
        id_token: Some(format!("eyJhbGciOiJub25lIn0.{}.sig", claims)),
        ..TokenResponse::default()
    }
}

pub fn error_response(error: &str, description: &str) -> TokenResponse {
    TokenResponse {
        error: Some(error.to_string()),
        error_description: Some(description.to_string()),
        ..TokenResponse::default()
    }
}
