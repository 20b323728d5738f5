//! Future-returning wrapper over the host's callback HTTP client.

use crate::host::{HostError, HttpClientRequest};
use crate::http::{Body, Method, ResponseInfo};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::oneshot;

/// Options for [`ProxyTool::fetch`](crate::ProxyTool::fetch).
///
/// Every field is optional; an unset option is not sent and the host
/// applies its default (GET, a 5 second timeout, certificate checks on,
/// cookies and redirects handled automatically, text bodies).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<Method>,
    /// Timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    /// Do not verify the server certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,
    /// Let the host manage cookies. When off, `Cookie` headers are plain headers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_cookie: Option<bool>,
    /// Follow 3xx redirects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_redirect: Option<bool>,
    /// Return the body as bytes instead of a decoded string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary_mode: Option<bool>,
}

impl FetchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a request header.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn timeout(mut self, seconds: u64) -> Self {
        self.timeout = Some(seconds);
        self
    }

    pub fn insecure(mut self, insecure: bool) -> Self {
        self.insecure = Some(insecure);
        self
    }

    pub fn auto_cookie(mut self, enabled: bool) -> Self {
        self.auto_cookie = Some(enabled);
        self
    }

    pub fn auto_redirect(mut self, enabled: bool) -> Self {
        self.auto_redirect = Some(enabled);
        self
    }

    pub fn binary_mode(mut self, enabled: bool) -> Self {
        self.binary_mode = Some(enabled);
        self
    }

    /// Host client handle this request is dispatched on.
    pub fn handle(&self) -> &'static str {
        self.method.unwrap_or_default().host_key()
    }

    /// Build the host request record for `url` carrying `body`.
    pub fn into_request(
        self,
        url: impl Into<String>,
        body: Option<crate::host::Payload>,
    ) -> HttpClientRequest {
        HttpClientRequest {
            url: url.into(),
            body,
            headers: self.headers,
            method: self.method,
            timeout: self.timeout,
            insecure: self.insecure,
            auto_cookie: self.auto_cookie,
            auto_redirect: self.auto_redirect,
            binary_mode: self.binary_mode,
        }
    }
}

/// Outcome of a successful fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchResult {
    pub response: ResponseInfo,
    pub body: Option<Body>,
}

impl FetchResult {
    /// Get the body as text if present.
    pub fn text(&self) -> Option<String> {
        self.body.as_ref().map(Body::text)
    }

    /// Parse the body as JSON if present.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Option<Result<T, serde_json::Error>> {
        self.body
            .as_ref()
            .map(|b| serde_json::from_slice(b.as_bytes()))
    }
}

/// Why a fetch failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The host reported an error; carried unchanged.
    #[error("host request failed: {0}")]
    Host(#[from] HostError),
    /// The host released the callback without ever calling it.
    #[error("host dropped the request without completing it")]
    Abandoned,
}

pub(crate) type Settlement = Result<FetchResult, FetchError>;

/// Adapt a oneshot sender into the host's `(error, response, body)` callback.
///
/// An error settles the future and returns at once, so a response that
/// arrives next to an error is never delivered.
pub(crate) fn settle_with(
    sender: oneshot::Sender<Settlement>,
) -> impl FnOnce(Option<HostError>, Option<ResponseInfo>, Option<Body>) + Send + 'static {
    move |error, response, body| {
        if let Some(error) = error {
            let _ = sender.send(Err(FetchError::Host(error)));
            return;
        }
        let _ = sender.send(Ok(FetchResult {
            response: response.unwrap_or_default(),
            body,
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_accept_method_in_any_case() {
        let options: FetchOptions = serde_json::from_value(serde_json::json!({
            "method": "post",
            "autoRedirect": false,
        }))
        .unwrap();

        assert_eq!(options.method, Some(Method::Post));
        assert_eq!(options.auto_redirect, Some(false));
        assert_eq!(options.handle(), "post");
    }

    #[test]
    fn test_request_record_uses_host_keys() {
        let options = FetchOptions::new()
            .header("Accept", "application/json")
            .method(Method::Post)
            .timeout(10)
            .insecure(true)
            .auto_cookie(false)
            .auto_redirect(true)
            .binary_mode(false);

        let request = options.into_request("http://example.com", Some("data".into()));
        let json = serde_json::to_value(&request).unwrap();
        let record = json.as_object().unwrap();

        assert_eq!(record["url"], "http://example.com");
        assert_eq!(record["body"], "data");
        assert_eq!(record["headers"], serde_json::json!({ "Accept": "application/json" }));
        assert_eq!(record["method"], "POST");
        assert_eq!(record["timeout"], 10);
        assert_eq!(record["insecure"], true);
        assert_eq!(record["auto-cookie"], false);
        assert_eq!(record["auto-redirect"], true);
        assert_eq!(record["binary-mode"], false);
        for camel in ["autoCookie", "autoRedirect", "binaryMode"] {
            assert!(!record.contains_key(camel), "{} leaked into the record", camel);
        }
    }

    #[test]
    fn test_absent_options_are_omitted() {
        let request = FetchOptions::new().into_request("http://example.com", None);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json, serde_json::json!({ "url": "http://example.com" }));
    }

    #[test]
    fn test_handle_defaults_to_get() {
        assert_eq!(FetchOptions::new().handle(), "get");
        assert_eq!(FetchOptions::new().method(Method::Put).handle(), "put");
    }

    #[test]
    fn test_deserializes_camel_case_options() {
        let options: FetchOptions = serde_json::from_value(serde_json::json!({
            "method": "DELETE",
            "autoCookie": true,
            "binaryMode": true,
        }))
        .unwrap();
        assert_eq!(options.method, Some(Method::Delete));
        assert_eq!(options.auto_cookie, Some(true));
        assert_eq!(options.binary_mode, Some(true));
        assert_eq!(options.auto_redirect, None);
    }

    #[tokio::test]
    async fn test_error_wins_over_response() {
        let (tx, rx) = oneshot::channel();
        let callback = settle_with(tx);
        callback(
            Some(HostError::new("reset")),
            Some(ResponseInfo::new(200)),
            Some(Body::from("late")),
        );
        assert_eq!(rx.await.unwrap(), Err(FetchError::Host(HostError::new("reset"))));
    }
}
