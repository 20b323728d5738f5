//! Local runtime: a host implementation and an HTTP server that runs
//! scripts against incoming requests.

mod client;
mod config;
mod local;
mod server;

pub use client::HttpClient;
pub use config::{ConfigError, RuntimeConfig, CONFIG_ENV};
pub use local::LocalHost;
pub use server::ScriptServer;
