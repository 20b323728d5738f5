//! Local runtime configuration.

use crate::host::{HostEnvironment, NetworkInfo};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Environment variable naming a JSON config file.
pub const CONFIG_ENV: &str = "PROXY_TOOL_CONFIG";

/// Error loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Configuration for the local script runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Environment record handed to scripts.
    pub environment: HostEnvironment,
    /// Network snapshot handed to scripts.
    pub network: NetworkInfo,
    /// Default timeout of script HTTP requests in seconds.
    pub http_timeout: u64,
    /// Redirect hops followed before a request fails.
    pub max_redirects: usize,
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
    /// File backing persistent storage. In memory when unset.
    pub storage_path: Option<PathBuf>,
    /// IP address to country code.
    pub geoip: HashMap<String, String>,
    /// IP address to AS organization.
    pub aso: HashMap<String, String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6170,
            environment: HostEnvironment {
                system: std::env::consts::OS.to_string(),
                language: "en".to_string(),
                build: "1".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                device_model: "local".to_string(),
            },
            network: NetworkInfo::default(),
            http_timeout: 5,
            max_redirects: 10,
            max_body_size: 10 * 1024 * 1024, // 10MB
            storage_path: None,
            geoip: HashMap::new(),
            aso: HashMap::new(),
        }
    }
}

impl RuntimeConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a config from a JSON file. Missing fields take defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the file named by `PROXY_TOOL_CONFIG`, or use defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Set the host address.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Persist storage to `path`.
    pub fn storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = Some(path.into());
        self
    }

    /// Set the default HTTP timeout in seconds.
    pub fn http_timeout(mut self, seconds: u64) -> Self {
        self.http_timeout = seconds;
        self
    }

    /// Add a GeoIP entry.
    pub fn geoip(mut self, ip: impl Into<String>, country: impl Into<String>) -> Self {
        self.geoip.insert(ip.into(), country.into());
        self
    }

    /// Add an AS organization entry.
    pub fn aso(mut self, ip: impl Into<String>, aso: impl Into<String>) -> Self {
        self.aso.insert(ip.into(), aso.into());
        self
    }

    /// Get the bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
