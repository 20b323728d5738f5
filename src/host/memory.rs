//! In-memory host.
//!
//! Snapshots and lookup tables are configured up front, side effects
//! (notifications, completions, HTTP calls) are recorded for inspection,
//! and HTTP replies come from a caller supplied responder. This is useful
//! for development and testing of scripts without a real proxy.

use super::{
    CompletionPayload, Host, HostEnvironment, HostError, HttpCallback, HttpClientRequest,
    NetworkInfo, NotificationWire, ScriptInfo,
};
use crate::http::{Body, RequestInfo, ResponseInfo};
use crate::store::{KeyValueStore, MemoryStore};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// How the in-memory HTTP client answers a request.
#[derive(Debug, Clone)]
pub enum HttpReply {
    /// Complete successfully.
    Respond(ResponseInfo, Option<Body>),
    /// Complete with a transport error.
    Fail(HostError),
    /// Report an error and a response in the same callback.
    FailWithResponse(HostError, ResponseInfo, Option<Body>),
    /// Drop the callback without invoking it.
    Abandon,
}

type Responder = Arc<dyn Fn(&str, &HttpClientRequest) -> HttpReply + Send + Sync>;

/// A notification captured by [`MemoryHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedNotification {
    pub title: String,
    pub subtitle: String,
    pub body: String,
    pub options: NotificationWire,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Host that keeps all state in memory.
pub struct MemoryHost {
    network: Mutex<NetworkInfo>,
    script: ScriptInfo,
    environment: HostEnvironment,
    request: Option<RequestInfo>,
    response: Option<ResponseInfo>,
    geoip: HashMap<String, String>,
    aso: HashMap<String, String>,
    store: Arc<dyn KeyValueStore>,
    responder: Option<Responder>,
    http_calls: Mutex<Vec<(String, HttpClientRequest)>>,
    notifications: Mutex<Vec<PostedNotification>>,
    completions: Mutex<Vec<Option<CompletionPayload>>>,
}

impl MemoryHost {
    /// Create an empty host with an in-memory store.
    pub fn new() -> Self {
        Self {
            network: Mutex::new(NetworkInfo::default()),
            script: ScriptInfo::default(),
            environment: HostEnvironment::default(),
            request: None,
            response: None,
            geoip: HashMap::new(),
            aso: HashMap::new(),
            store: Arc::new(MemoryStore::new()),
            responder: None,
            http_calls: Mutex::new(Vec::new()),
            notifications: Mutex::new(Vec::new()),
            completions: Mutex::new(Vec::new()),
        }
    }

    /// Set the network snapshot.
    pub fn with_network(self, network: NetworkInfo) -> Self {
        *lock(&self.network) = network;
        self
    }

    /// Set the script metadata.
    pub fn with_script(mut self, script: ScriptInfo) -> Self {
        self.script = script;
        self
    }

    /// Set the environment record.
    pub fn with_environment(mut self, environment: HostEnvironment) -> Self {
        self.environment = environment;
        self
    }

    /// Attach a request snapshot.
    pub fn with_request(mut self, request: RequestInfo) -> Self {
        self.request = Some(request);
        self
    }

    /// Attach a response snapshot.
    pub fn with_response(mut self, response: ResponseInfo) -> Self {
        self.response = Some(response);
        self
    }

    /// Map an IP address to a country code.
    pub fn with_geoip(mut self, ip: impl Into<String>, country: impl Into<String>) -> Self {
        self.geoip.insert(ip.into(), country.into());
        self
    }

    /// Map an IP address to an AS organization.
    pub fn with_aso(mut self, ip: impl Into<String>, aso: impl Into<String>) -> Self {
        self.aso.insert(ip.into(), aso.into());
        self
    }

    /// Use a different persistent store.
    pub fn with_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = store;
        self
    }

    /// Answer HTTP requests with `responder`, which receives the method
    /// handle name and the request record.
    pub fn with_responder<F>(mut self, responder: F) -> Self
    where
        F: Fn(&str, &HttpClientRequest) -> HttpReply + Send + Sync + 'static,
    {
        self.responder = Some(Arc::new(responder));
        self
    }

    /// Replace the network snapshot on a live host.
    pub fn set_network(&self, network: NetworkInfo) {
        *lock(&self.network) = network;
    }

    /// HTTP calls seen so far, as `(method handle, request)`.
    pub fn http_calls(&self) -> Vec<(String, HttpClientRequest)> {
        lock(&self.http_calls).clone()
    }

    /// Notifications posted so far.
    pub fn notifications(&self) -> Vec<PostedNotification> {
        lock(&self.notifications).clone()
    }

    /// Completion signals received so far.
    pub fn completions(&self) -> Vec<Option<CompletionPayload>> {
        lock(&self.completions).clone()
    }
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl Host for MemoryHost {
    fn network(&self) -> NetworkInfo {
        lock(&self.network).clone()
    }

    fn script(&self) -> ScriptInfo {
        self.script.clone()
    }

    fn environment(&self) -> HostEnvironment {
        self.environment.clone()
    }

    fn request(&self) -> Option<RequestInfo> {
        self.request.clone()
    }

    fn response(&self) -> Option<ResponseInfo> {
        self.response.clone()
    }

    fn geoip(&self, ip: &str) -> Option<String> {
        self.geoip.get(ip).cloned()
    }

    fn ipaso(&self, ip: &str) -> Option<String> {
        self.aso.get(ip).cloned()
    }

    fn post_notification(&self, title: &str, subtitle: &str, body: &str, options: NotificationWire) {
        lock(&self.notifications).push(PostedNotification {
            title: title.to_string(),
            subtitle: subtitle.to_string(),
            body: body.to_string(),
            options,
        });
    }

    fn write_persistent(&self, value: &str, key: &str) -> bool {
        self.store.write(key, value).is_ok()
    }

    fn read_persistent(&self, key: &str) -> Option<String> {
        self.store.read(key).ok().flatten()
    }

    fn http_client(&self, method: &str, request: HttpClientRequest, callback: HttpCallback) {
        debug!("MemoryHost {} {}", method, request.url);
        lock(&self.http_calls).push((method.to_string(), request.clone()));

        let reply = match &self.responder {
            Some(responder) => responder(method, &request),
            None => HttpReply::Fail(HostError::new(format!(
                "no responder configured for {}",
                request.url
            ))),
        };

        match reply {
            HttpReply::Respond(response, body) => callback(None, Some(response), body),
            HttpReply::Fail(error) => callback(Some(error), None, None),
            HttpReply::FailWithResponse(error, response, body) => {
                callback(Some(error), Some(response), body)
            }
            HttpReply::Abandon => drop(callback),
        }
    }

    fn done(&self, payload: Option<CompletionPayload>) {
        lock(&self.completions).push(payload);
    }
}
