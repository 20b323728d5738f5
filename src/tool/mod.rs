//! The script-facing facade over a [`Host`].

mod done;
mod fetch;
mod notify;

pub use done::Completion;
pub use fetch::{FetchError, FetchOptions, FetchResult};
pub use notify::NotifyOptions;

use crate::host::{EnvironmentInfo, Host, NetworkInfo, Payload, ScriptInfo};
use crate::http::{RequestInfo, ResponseInfo};
use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::debug;

/// Single entry point for scripts.
///
/// Every accessor reads the host at call time and returns a fresh value;
/// nothing is cached. Cloning is cheap and clones share the host, so
/// concurrent fetches can be spread over tasks.
#[derive(Clone)]
pub struct ProxyTool {
    host: Arc<dyn Host>,
}

impl ProxyTool {
    /// Wrap a host.
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self { host }
    }

    /// The wrapped host.
    pub fn host(&self) -> &Arc<dyn Host> {
        &self.host
    }

    /// Network state: Wi-Fi, IPv4, IPv6 and DNS servers.
    pub fn network(&self) -> NetworkInfo {
        self.host.network()
    }

    /// Name, start time and type of the running script.
    pub fn script(&self) -> ScriptInfo {
        self.host.script()
    }

    /// System, UI language, host build and version, and device model.
    pub fn environment(&self) -> EnvironmentInfo {
        self.host.environment().into()
    }

    /// The request the script acts on. `None` outside an HTTP context.
    pub fn request(&self) -> Option<RequestInfo> {
        self.host.request()
    }

    /// The captured response. Its URL is on [`request`](Self::request).
    /// Fields stay empty unless the host was told to capture the body.
    pub fn response(&self) -> Option<ResponseInfo> {
        self.host.response()
    }

    /// Country code (ISO 3166) of `ip`.
    pub fn geoip(&self, ip: &str) -> Option<String> {
        self.host.geoip(ip)
    }

    /// AS organization of `ip`.
    pub fn ipaso(&self, ip: &str) -> Option<String> {
        self.host.ipaso(ip)
    }

    /// Inflate gzip data, byte for byte.
    pub fn ungzip(&self, data: &[u8]) -> Option<Bytes> {
        self.host.ungzip(data)
    }

    /// Post a notification.
    pub fn notify(&self, title: &str, subtitle: &str, body: &str, options: NotifyOptions) {
        debug!("Posting notification '{}'", title);
        self.host
            .post_notification(title, subtitle, body, options.into());
    }

    /// Persist `value` under `key`. Returns whether the host committed it.
    pub fn set_storage(&self, key: &str, value: &str) -> bool {
        self.host.write_persistent(value, key)
    }

    /// Read the value stored under `key`.
    pub fn get_storage(&self, key: &str) -> Option<String> {
        self.host.read_persistent(key)
    }

    /// Send an HTTP request through the host client.
    ///
    /// `data` becomes the request body; structured values are serialized by
    /// the host. Resolves once the host reports completion. There is no
    /// local timeout, retry or cancellation.
    pub async fn fetch(
        &self,
        url: impl Into<String>,
        data: Option<Payload>,
        options: FetchOptions,
    ) -> Result<FetchResult, FetchError> {
        let handle = options.handle();
        let request = options.into_request(url, data);
        debug!("Dispatching {} {}", handle, request.url);

        let (tx, rx) = oneshot::channel();
        self.host
            .http_client(handle, request, Box::new(fetch::settle_with(tx)));

        rx.await.unwrap_or(Err(FetchError::Abandoned))
    }

    /// Tell the host the script is finished.
    ///
    /// Accepts `()`, a body string, or a full payload object.
    pub fn done(&self, completion: impl Into<Completion>) {
        let payload = completion.into().into_payload();
        debug!("Script done (payload: {})", payload.is_some());
        self.host.done(payload);
    }
}

impl std::fmt::Debug for ProxyTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyTool").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HostEnvironment, MemoryHost};

    #[test]
    fn test_environment_is_renamed() {
        let host = MemoryHost::new().with_environment(HostEnvironment {
            system: "macOS".to_string(),
            language: "zh-Hans".to_string(),
            build: "2100".to_string(),
            version: "5.0".to_string(),
            device_model: "Mac14,2".to_string(),
        });
        let tool = ProxyTool::new(Arc::new(host));

        let env = tool.environment();
        assert_eq!(env.system, "macOS");
        assert_eq!(env.host_build, "2100");
        assert_eq!(env.host_version, "5.0");
        assert_eq!(env.device_model, "Mac14,2");
    }

    #[test]
    fn test_accessors_read_current_host_state() {
        let host = Arc::new(MemoryHost::new());
        let tool = ProxyTool::new(host.clone());
        assert!(tool.network().dns.is_empty());

        host.set_network(NetworkInfo {
            dns: vec!["8.8.8.8".to_string()],
            ..Default::default()
        });
        assert_eq!(tool.network().dns, vec!["8.8.8.8".to_string()]);
    }

    #[test]
    fn test_missing_context_is_none() {
        let tool = ProxyTool::new(Arc::new(MemoryHost::new()));
        assert!(tool.request().is_none());
        assert!(tool.response().is_none());
        assert!(tool.geoip("not-an-ip").is_none());
    }
}
