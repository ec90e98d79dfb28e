//! Error types shared by both adapters.

use thiserror::Error;

/// Failures raised by the scripting bridge, the Graph API, configuration
/// lookup and the device-code authentication sequence.
#[derive(Error, Debug)]
pub enum Error {
    #[error("AppleScript error: {stderr}")]
    ScriptFailed { stderr: String },

    #[error("AppleScript timed out after {seconds} seconds")]
    ScriptTimeout { seconds: u64 },

    #[error("failed to launch script runner: {0}")]
    ScriptSpawn(#[source] std::io::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("{var} environment variable is not set")]
    MissingEnv { var: &'static str },

    #[error("authentication failed: {description}")]
    Authentication { description: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
