//! Runs AppleScript through `osascript`.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, error};

use crate::error::{Error, Result};

/// Default upper bound for a single script run.
pub const SCRIPT_TIMEOUT: Duration = Duration::from_secs(30);

/// Scripting bridge invoking `<program> -e <script>`.
#[derive(Debug, Clone)]
pub struct Osascript {
    program: String,
    timeout: Duration,
}

impl Default for Osascript {
    fn default() -> Self {
        Self::new("osascript")
    }
}

impl Osascript {
    /// # Arguments
    /// * `program` - Executable called as `<program> -e <script>`
    ///
    /// # Returns
    /// A bridge using the default 30 second timeout
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            timeout: SCRIPT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run `script` and return its trimmed stdout.
    ///
    /// The child is awaited on the tokio reactor, so a slow script never
    /// stalls other requests. It is killed when the timeout elapses.
    pub async fn run(&self, script: &str) -> Result<String> {
        debug!(program = %self.program, "Running AppleScript");

        let child = Command::new(&self.program)
            .arg("-e")
            .arg(script)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(Error::ScriptSpawn)?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(Error::ScriptSpawn)?,
            Err(_) => {
                error!(seconds = self.timeout.as_secs(), "AppleScript timed out");
                return Err(Error::ScriptTimeout {
                    seconds: self.timeout.as_secs(),
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!("AppleScript failed: {}", stderr);
            return Err(Error::ScriptFailed { stderr });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
