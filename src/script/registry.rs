//! Registry of scripts available to the host.

use crate::host::Host;
use crate::script::handler::{ProxyScript, ScriptError};
use crate::tool::ProxyTool;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

/// Registry entry.
struct ScriptEntry {
    script: Arc<dyn ProxyScript>,
    /// Completed or failed invocations.
    invocations: u64,
}

/// Summary of a registered script.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ScriptSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub script_type: String,
    pub timeout: u64,
    pub invocations: u64,
}

/// Registry for scripts, keyed by name.
pub struct ScriptRegistry {
    scripts: RwLock<HashMap<String, ScriptEntry>>,
}

impl ScriptRegistry {
    /// Create a new script registry.
    pub fn new() -> Self {
        Self {
            scripts: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new script.
    pub async fn register(
        &self,
        name: impl Into<String>,
        script: Box<dyn ProxyScript>,
    ) -> Result<(), ScriptError> {
        let name = name.into();
        let mut scripts = self.scripts.write().await;

        if scripts.contains_key(&name) {
            return Err(ScriptError::new(format!(
                "Script '{}' is already registered",
                name
            )));
        }

        scripts.insert(
            name.clone(),
            ScriptEntry {
                script: Arc::from(script),
                invocations: 0,
            },
        );
        info!("Registered script: {}", name);
        Ok(())
    }

    /// Look up a script by name.
    pub async fn get(&self, name: &str) -> Option<Arc<dyn ProxyScript>> {
        let scripts = self.scripts.read().await;
        scripts.get(name).map(|entry| entry.script.clone())
    }

    /// Run a script once against `host`.
    ///
    /// The invocation is cut off after the script's timeout.
    pub async fn execute(&self, name: &str, host: Arc<dyn Host>) -> Result<(), ScriptError> {
        let script = self
            .get(name)
            .await
            .ok_or_else(|| ScriptError::not_found(format!("Script '{}' not found", name)))?;

        let timeout = script.timeout();
        let tool = ProxyTool::new(host);
        debug!("Running script '{}' (timeout {}s)", name, timeout);

        let result = match tokio::time::timeout(Duration::from_secs(timeout), script.run(&tool)).await
        {
            Ok(result) => result,
            Err(_) => Err(ScriptError::timeout(format!(
                "Script '{}' timed out after {}s",
                name, timeout
            ))),
        };

        if let Err(e) = &result {
            error!("Script '{}' failed: {}", name, e);
        }

        let mut scripts = self.scripts.write().await;
        if let Some(entry) = scripts.get_mut(name) {
            entry.invocations += 1;
        }

        result
    }

    /// List all registered scripts.
    pub async fn list(&self) -> Vec<ScriptSummary> {
        let scripts = self.scripts.read().await;
        let mut summaries: Vec<_> = scripts
            .iter()
            .map(|(name, entry)| ScriptSummary {
                name: name.clone(),
                script_type: entry
                    .script
                    .manifest()
                    .map(|m| m.script_type.to_string())
                    .unwrap_or_else(|| "generic".to_string()),
                timeout: entry.script.timeout(),
                invocations: entry.invocations,
            })
            .collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        summaries
    }

    /// Remove a script from the registry.
    pub async fn remove(&self, name: &str) -> Result<(), ScriptError> {
        let mut scripts = self.scripts.write().await;
        scripts
            .remove(name)
            .ok_or_else(|| ScriptError::not_found(format!("Script '{}' not found", name)))?;

        info!("Removed script: {}", name);
        Ok(())
    }
}

impl Default for ScriptRegistry {
    fn default() -> Self {
        Self::new()
    }
}
