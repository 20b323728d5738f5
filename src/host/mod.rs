//! The contract between scripts and the proxy host that runs them.
//!
//! A [`Host`] supplies every capability a script can reach: context
//! snapshots, lookup utilities, notifications, persistent storage, the
//! HTTP client, and the completion signal. [`ProxyTool`](crate::ProxyTool)
//! wraps one behind a friendlier surface.

mod memory;
mod records;
mod wire;

pub use memory::{HttpReply, MemoryHost, PostedNotification};
pub use records::{
    EnvironmentInfo, HostEnvironment, Ipv4Info, Ipv6Info, NetworkInfo, ScriptInfo, ScriptType,
    WifiInfo,
};
pub use wire::{HttpClientRequest, NotificationWire, NotifyAction, Payload};

use crate::http::{Body, RequestInfo, ResponseInfo};
use bytes::Bytes;
use std::io::Read;

/// Completion payload, `{ body, headers, ... }` by host convention.
pub type CompletionPayload = serde_json::Map<String, serde_json::Value>;

/// One-shot completion callback of the host HTTP client.
///
/// Receives `(error, response, body)`. Being `FnOnce`, it can be invoked at
/// most once per request.
pub type HttpCallback =
    Box<dyn FnOnce(Option<HostError>, Option<ResponseInfo>, Option<Body>) + Send + 'static>;

/// Error value reported by the host. Opaque to this crate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct HostError {
    pub message: String,
}

impl HostError {
    /// Create a new host error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Capabilities provided by a proxy host.
pub trait Host: Send + Sync {
    /// Current network state.
    fn network(&self) -> NetworkInfo;

    /// Metadata of the running script.
    fn script(&self) -> ScriptInfo;

    /// Environment record in host key convention.
    fn environment(&self) -> HostEnvironment;

    /// The request the script is attached to, if any.
    fn request(&self) -> Option<RequestInfo>;

    /// The captured response, if any.
    fn response(&self) -> Option<ResponseInfo>;

    /// ISO 3166 country code of an IP address.
    fn geoip(&self, ip: &str) -> Option<String>;

    /// Autonomous system organization of an IP address.
    fn ipaso(&self, ip: &str) -> Option<String>;

    /// Inflate gzip data. `None` when the input is not valid gzip.
    fn ungzip(&self, data: &[u8]) -> Option<Bytes> {
        gunzip(data)
    }

    /// Post a user notification. Fire and forget.
    fn post_notification(&self, title: &str, subtitle: &str, body: &str, options: NotificationWire);

    /// Durably store `value` under `key`. Note the host's argument order.
    fn write_persistent(&self, value: &str, key: &str) -> bool;

    /// Read a previously stored value.
    fn read_persistent(&self, key: &str) -> Option<String>;

    /// Start an HTTP request on the client handle named `method`
    /// (lowercase). `callback` fires once the request finishes.
    fn http_client(&self, method: &str, request: HttpClientRequest, callback: HttpCallback);

    /// Signal that the script finished.
    fn done(&self, payload: Option<CompletionPayload>);
}

/// Gzip inflate shared by the bundled hosts.
pub(crate) fn gunzip(data: &[u8]) -> Option<Bytes> {
    let mut decoder = flate2::read::GzDecoder::new(data);
    let mut inflated = Vec::new();
    decoder.read_to_end(&mut inflated).ok()?;
    Some(Bytes::from(inflated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_gunzip_preserves_bytes() {
        let raw: Vec<u8> = (0..=255u8).collect();
        let inflated = gunzip(&gzip(&raw)).unwrap();
        assert_eq!(inflated.as_ref(), raw.as_slice());
    }

    #[test]
    fn test_gunzip_rejects_garbage() {
        assert!(gunzip(b"not gzip at all").is_none());
    }
}
