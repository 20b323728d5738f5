//! Script manifest for compile-time metadata.
//!
//! The manifest mirrors a script entry of a proxy module: name, type,
//! the URL pattern it is attached to, and its timeout.

use crate::host::ScriptType;
use crate::script::handler::DEFAULT_SCRIPT_TIMEOUT;
use serde::Serialize;

/// Metadata of a script.
///
/// Generated by the `#[proxy_script]` macro.
#[derive(Debug, Clone, Serialize)]
pub struct ScriptManifest {
    /// Unique script name.
    pub name: &'static str,
    /// Script category.
    #[serde(rename = "type")]
    pub script_type: ScriptType,
    /// URL pattern (regular expression) for HTTP scripts; empty otherwise.
    pub pattern: &'static str,
    /// Timeout in seconds.
    pub timeout: u64,
    /// Optional description of the script.
    pub description: &'static str,
}

impl ScriptManifest {
    /// Create a generic script manifest.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            script_type: ScriptType::Generic,
            pattern: "",
            timeout: DEFAULT_SCRIPT_TIMEOUT,
            description: "",
        }
    }

    pub const fn with_type(mut self, script_type: ScriptType) -> Self {
        self.script_type = script_type;
        self
    }

    pub const fn with_pattern(mut self, pattern: &'static str) -> Self {
        self.pattern = pattern;
        self
    }

    pub const fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = timeout;
        self
    }

    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static MANIFEST: ScriptManifest = ScriptManifest::new("rewrite")
        .with_type(ScriptType::HttpResponse)
        .with_pattern("^https://api\\.example\\.com/")
        .with_timeout(10);

    #[test]
    fn test_const_builder() {
        assert_eq!(MANIFEST.name, "rewrite");
        assert_eq!(MANIFEST.script_type, ScriptType::HttpResponse);
        assert_eq!(MANIFEST.timeout, 10);
        assert_eq!(MANIFEST.description, "");
    }

    #[test]
    fn test_serializes_type_key() {
        let json = serde_json::to_value(&MANIFEST).unwrap();
        assert_eq!(json["type"], "http-response");
        assert_eq!(json["pattern"], "^https://api\\.example\\.com/");
    }
}
