//! HTTP client behind [`LocalHost`](super::LocalHost).

use crate::host::{HostError, HttpClientRequest, Payload};
use crate::http::{Body, Method, ResponseInfo, StatusCode, UnknownMethod};
use reqwest::cookie::Jar;
use reqwest::header::HeaderMap;
use reqwest::redirect::Policy;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

/// Request options that need their own `reqwest::Client`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ClientKey {
    cookies: bool,
    redirects: bool,
    insecure: bool,
}

impl ClientKey {
    fn for_request(request: &HttpClientRequest) -> Self {
        Self {
            cookies: request.auto_cookie.unwrap_or(true),
            redirects: request.auto_redirect.unwrap_or(true),
            insecure: request.insecure.unwrap_or(false),
        }
    }
}

/// HTTP client with one cookie jar shared by every request.
///
/// A `reqwest::Client` is built on first use for each combination of the
/// cookie, redirect and certificate options, then reused.
#[derive(Clone)]
pub struct HttpClient {
    jar: Arc<Jar>,
    clients: Arc<Mutex<HashMap<ClientKey, reqwest::Client>>>,
    default_timeout: u64,
    max_redirects: usize,
}

impl HttpClient {
    /// Create a client with the given default timeout (seconds) and
    /// redirect limit.
    pub fn new(default_timeout: u64, max_redirects: usize) -> Self {
        Self {
            jar: Arc::new(Jar::default()),
            clients: Arc::new(Mutex::new(HashMap::new())),
            default_timeout,
            max_redirects,
        }
    }

    /// Perform `request` on the handle named `method`.
    pub async fn send(
        &self,
        method: &str,
        request: HttpClientRequest,
    ) -> Result<(ResponseInfo, Body), HostError> {
        let method: Method = method
            .parse()
            .map_err(|e: UnknownMethod| HostError::new(e.to_string()))?;
        let client = self.client_for(ClientKey::for_request(&request))?;
        let seconds = request.timeout.unwrap_or(self.default_timeout);
        let binary_mode = request.binary_mode.unwrap_or(false);
        let url = request.url;

        let mut builder = client
            .request(reqwest::Method::from(method), url.as_str())
            .timeout(Duration::from_secs(seconds));
        for (name, value) in request.headers.iter().flatten() {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match request.body {
            None => builder,
            Some(Payload::Text(text)) => builder.body(text),
            Some(Payload::Binary(bytes)) => builder.body(bytes),
            Some(Payload::Json(value)) => builder.json(&value),
        };

        debug!("{} {}", method, url);
        let response = builder
            .send()
            .await
            .map_err(|e| request_error(&url, seconds, e))?;

        let status = StatusCode(response.status().as_u16());
        let headers = collect_headers(response.headers());
        let bytes = response
            .bytes()
            .await
            .map_err(|e| request_error(&url, seconds, e))?;
        let body = if binary_mode {
            Body::Binary(bytes)
        } else {
            Body::Text(String::from_utf8_lossy(&bytes).into_owned())
        };

        let info = ResponseInfo {
            status: Some(status),
            headers: Some(headers),
            body: None,
        };
        Ok((info, body))
    }

    fn clients(&self) -> MutexGuard<'_, HashMap<ClientKey, reqwest::Client>> {
        self.clients
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn client_for(&self, key: ClientKey) -> Result<reqwest::Client, HostError> {
        let mut clients = self.clients();
        if let Some(client) = clients.get(&key) {
            return Ok(client.clone());
        }

        let policy = if key.redirects {
            Policy::limited(self.max_redirects)
        } else {
            Policy::none()
        };
        let mut builder = reqwest::Client::builder()
            .redirect(policy)
            .danger_accept_invalid_certs(key.insecure);
        if key.cookies {
            builder = builder.cookie_provider(self.jar.clone());
        }
        let client = builder
            .build()
            .map_err(|e| HostError::new(format!("failed to build HTTP client: {}", e)))?;

        debug!("Built HTTP client for {:?}", key);
        clients.insert(key, client.clone());
        Ok(client)
    }
}

fn request_error(url: &str, seconds: u64, e: reqwest::Error) -> HostError {
    if e.is_timeout() {
        HostError::new(format!("request to {} timed out after {}s", url, seconds))
    } else {
        HostError::new(e.to_string())
    }
}

/// Flatten response headers; repeated headers are joined with `, `.
fn collect_headers(headers: &HeaderMap) -> HashMap<String, String> {
    let mut collected: HashMap<String, String> = HashMap::new();
    for (name, value) in headers {
        let Ok(value) = value.to_str() else { continue };
        collected
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }
    collected
}
