//! # proxy-tool
//!
//! A typed facade for proxy scripts. The capabilities a proxy host offers
//! a script (network and environment facts, the request and response it is
//! attached to, GeoIP lookups, gzip, notifications, persistent storage, an
//! HTTP client and the completion signal) are reached through one
//! [`ProxyTool`] with plain names, typed options and an async `fetch`.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐      ┌──────────────┐      ┌──────────────────────────┐
//! │    Script    │ ───▶ │  ProxyTool   │ ───▶ │       dyn Host           │
//! │ (ProxyScript)│      │ (option      │      │  MemoryHost | LocalHost  │
//! └──────────────┘      │  translation)│      │  | your proxy's bindings │
//!                       └──────────────┘      └──────────────────────────┘
//! ```
//!
//! The host is injected, so the same script runs inside a real proxy, in
//! the bundled [`ScriptServer`], or against a [`MemoryHost`] in tests.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use proxy_tool::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let host = MemoryHost::new().with_responder(|_, _| {
//!         HttpReply::Respond(ResponseInfo::new(200), Some(Body::from("pong")))
//!     });
//!     let tool = ProxyTool::new(Arc::new(host));
//!
//!     let result = tool
//!         .fetch("http://example.com/ping", None, FetchOptions::new().timeout(3))
//!         .await?;
//!     tool.notify("Ping", "", &result.text().unwrap_or_default(), NotifyOptions::new());
//!     tool.done(());
//!     Ok(())
//! }
//! ```

pub mod host;
pub mod http;
pub mod runtime;
pub mod script;
pub mod store;
pub mod tool;

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::host::{
        EnvironmentInfo, Host, HostError, HttpReply, MemoryHost, NetworkInfo, NotifyAction,
        Payload, ScriptInfo, ScriptType,
    };
    pub use crate::http::{Body, Method, RequestInfo, ResponseInfo, StatusCode};
    pub use crate::runtime::{RuntimeConfig, ScriptServer};
    pub use crate::script::{ProxyScript, ScriptError, ScriptManifest, ScriptRegistry};
    pub use crate::tool::{
        Completion, FetchError, FetchOptions, FetchResult, NotifyOptions, ProxyTool,
    };
    pub use async_trait::async_trait;
    pub use proxy_tool_macro::proxy_script;
}

// Re-export for convenience
pub use host::{Host, MemoryHost};
pub use runtime::{RuntimeConfig, ScriptServer};
pub use script::{ProxyScript, ScriptError, ScriptRegistry};
pub use tool::{FetchOptions, NotifyOptions, ProxyTool};
