//! Host implementation backing the local runtime.

use super::client::HttpClient;
use super::config::RuntimeConfig;
use crate::host::{
    CompletionPayload, Host, HostEnvironment, HostError, HttpCallback, HttpClientRequest,
    NetworkInfo, NotificationWire, ScriptInfo,
};
use crate::http::{RequestInfo, ResponseInfo};
use crate::store::KeyValueStore;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Host serving one script invocation.
///
/// Configuration, storage and the HTTP client are shared between
/// invocations; the request snapshot and the completion slot are not.
pub struct LocalHost {
    config: Arc<RuntimeConfig>,
    store: Arc<dyn KeyValueStore>,
    client: HttpClient,
    script: ScriptInfo,
    request: Option<RequestInfo>,
    response: Option<ResponseInfo>,
    completion: Mutex<Option<Option<CompletionPayload>>>,
}

impl LocalHost {
    /// Create a host for a script invocation.
    pub fn new(
        config: Arc<RuntimeConfig>,
        store: Arc<dyn KeyValueStore>,
        client: HttpClient,
        script: ScriptInfo,
    ) -> Self {
        Self {
            config,
            store,
            client,
            script,
            request: None,
            response: None,
            completion: Mutex::new(None),
        }
    }

    /// Attach the request the script acts on.
    pub fn with_request(mut self, request: RequestInfo) -> Self {
        self.request = Some(request);
        self
    }

    /// Attach a captured response.
    pub fn with_response(mut self, response: ResponseInfo) -> Self {
        self.response = Some(response);
        self
    }

    fn slot(&self) -> MutexGuard<'_, Option<Option<CompletionPayload>>> {
        self.completion
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Take the completion signal, if the script sent one.
    ///
    /// The outer `Option` tells whether `done` was called; the inner one
    /// holds its payload.
    pub fn take_completion(&self) -> Option<Option<CompletionPayload>> {
        self.slot().take()
    }
}

impl Host for LocalHost {
    fn network(&self) -> NetworkInfo {
        self.config.network.clone()
    }

    fn script(&self) -> ScriptInfo {
        self.script.clone()
    }

    fn environment(&self) -> HostEnvironment {
        self.config.environment.clone()
    }

    fn request(&self) -> Option<RequestInfo> {
        self.request.clone()
    }

    fn response(&self) -> Option<ResponseInfo> {
        self.response.clone()
    }

    fn geoip(&self, ip: &str) -> Option<String> {
        self.config.geoip.get(ip).cloned()
    }

    fn ipaso(&self, ip: &str) -> Option<String> {
        self.config.aso.get(ip).cloned()
    }

    fn post_notification(&self, title: &str, subtitle: &str, body: &str, options: NotificationWire) {
        info!(
            script = %self.script.name,
            "Notification: {} | {} | {} {}",
            title,
            subtitle,
            body,
            serde_json::to_string(&options).unwrap_or_default()
        );
    }

    fn write_persistent(&self, value: &str, key: &str) -> bool {
        match self.store.write(key, value) {
            Ok(()) => true,
            Err(e) => {
                warn!("Storage write of '{}' failed: {}", key, e);
                false
            }
        }
    }

    fn read_persistent(&self, key: &str) -> Option<String> {
        match self.store.read(key) {
            Ok(value) => value,
            Err(e) => {
                warn!("Storage read of '{}' failed: {}", key, e);
                None
            }
        }
    }

    fn http_client(&self, method: &str, request: HttpClientRequest, callback: HttpCallback) {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                callback(Some(HostError::new(e.to_string())), None, None);
                return;
            }
        };

        let client = self.client.clone();
        let method = method.to_string();
        runtime.spawn(async move {
            match client.send(&method, request).await {
                Ok((response, body)) => callback(None, Some(response), Some(body)),
                Err(e) => {
                    debug!("HTTP {} failed: {}", method, e);
                    callback(Some(e), None, None)
                }
            }
        });
    }

    fn done(&self, payload: Option<CompletionPayload>) {
        let mut slot = self.slot();
        if slot.is_some() {
            warn!("Script '{}' called done more than once; keeping the first", self.script.name);
            return;
        }
        *slot = Some(payload);
    }
}
