//! Scripts and the registry the host runs them from.

pub mod handler;
pub mod manifest;
pub mod registry;

pub use handler::{ProxyScript, ScriptError, DEFAULT_SCRIPT_TIMEOUT};
pub use manifest::ScriptManifest;
pub use registry::{ScriptRegistry, ScriptSummary};
