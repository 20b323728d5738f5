//! Script trait and error type.

use crate::script::manifest::ScriptManifest;
use crate::tool::{FetchError, ProxyTool};
use async_trait::async_trait;

/// Seconds a script may run when its manifest does not say otherwise.
pub const DEFAULT_SCRIPT_TIMEOUT: u64 = 30;

/// A script run by the host.
///
/// A script reads its context through the [`ProxyTool`] it is given and
/// finishes by calling [`ProxyTool::done`].
#[async_trait]
pub trait ProxyScript: Send + Sync {
    /// Run one invocation.
    async fn run(&self, tool: &ProxyTool) -> Result<(), ScriptError>;

    /// Script name.
    fn name(&self) -> &str;

    /// Compile-time metadata, if the script has any.
    fn manifest(&self) -> Option<&'static ScriptManifest> {
        None
    }

    /// Seconds an invocation may take before the host gives up on it.
    fn timeout(&self) -> u64 {
        self.manifest()
            .map(|m| m.timeout)
            .unwrap_or(DEFAULT_SCRIPT_TIMEOUT)
    }
}

/// Script failure, carrying the HTTP status the host answers with.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("[{code}] {message}")]
pub struct ScriptError {
    /// Error message.
    pub message: String,
    /// Error code.
    pub code: u16,
}

impl ScriptError {
    /// Create a new ScriptError.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: 500,
        }
    }

    /// Create a ScriptError with a specific code.
    pub fn with_code(code: u16, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_code(404, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::with_code(400, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::with_code(504, message)
    }
}

impl From<FetchError> for ScriptError {
    fn from(err: FetchError) -> Self {
        ScriptError::with_code(502, err.to_string())
    }
}

impl From<std::io::Error> for ScriptError {
    fn from(err: std::io::Error) -> Self {
        ScriptError::new(err.to_string())
    }
}

impl From<serde_json::Error> for ScriptError {
    fn from(err: serde_json::Error) -> Self {
        ScriptError::bad_request(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostError;

    #[test]
    fn test_fetch_error_maps_to_bad_gateway() {
        let err: ScriptError = FetchError::Host(HostError::new("refused")).into();
        assert_eq!(err.code, 502);
        assert!(err.message.contains("refused"));
    }

    #[test]
    fn test_display_includes_code() {
        assert_eq!(ScriptError::not_found("gone").to_string(), "[404] gone");
    }
}
