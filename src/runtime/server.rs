//! HTTP server running registered scripts against incoming requests.

use super::client::HttpClient;
use super::config::RuntimeConfig;
use super::local::LocalHost;
use crate::host::{CompletionPayload, ScriptInfo, ScriptType};
use crate::http::{Body, Method, RequestInfo, ResponseInfo, StatusCode};
use crate::script::{ProxyScript, ScriptError, ScriptRegistry};
use crate::store::{FileStore, KeyValueStore, MemoryStore, StoreError};
use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

/// Shared state of a running server.
#[derive(Clone)]
struct Shared {
    config: Arc<RuntimeConfig>,
    registry: Arc<ScriptRegistry>,
    store: Arc<dyn KeyValueStore>,
    client: HttpClient,
}

/// Local script server.
///
/// `/{script}/{rest}` runs `script` with the incoming request as its
/// context; the payload the script passes to `done` becomes the response.
pub struct ScriptServer {
    shared: Shared,
}

impl ScriptServer {
    /// Create a server. Opens the storage file when one is configured.
    pub fn new(config: RuntimeConfig) -> Result<Self, StoreError> {
        let store: Arc<dyn KeyValueStore> = match &config.storage_path {
            Some(path) => Arc::new(FileStore::open(path)?),
            None => Arc::new(MemoryStore::new()),
        };
        let client = HttpClient::new(config.http_timeout, config.max_redirects);
        Ok(Self {
            shared: Shared {
                config: Arc::new(config),
                registry: Arc::new(ScriptRegistry::new()),
                store,
                client,
            },
        })
    }

    /// Create a server with default configuration and in-memory storage.
    pub fn with_defaults() -> Self {
        let config = RuntimeConfig::default();
        let client = HttpClient::new(config.http_timeout, config.max_redirects);
        Self {
            shared: Shared {
                config: Arc::new(config),
                registry: Arc::new(ScriptRegistry::new()),
                store: Arc::new(MemoryStore::new()),
                client,
            },
        }
    }

    /// Get the script registry.
    pub fn registry(&self) -> Arc<ScriptRegistry> {
        self.shared.registry.clone()
    }

    /// Get the persistent store shared by all invocations.
    pub fn store(&self) -> Arc<dyn KeyValueStore> {
        self.shared.store.clone()
    }

    /// Register a script with the server.
    pub async fn register_script(
        &self,
        name: impl Into<String>,
        script: Box<dyn ProxyScript>,
    ) -> Result<(), ScriptError> {
        self.shared.registry.register(name, script).await
    }

    /// Run one script invocation for `request` and build the HTTP answer.
    pub async fn dispatch(&self, name: &str, request: RequestInfo) -> ResponseInfo {
        run_script(&self.shared, name, request).await
    }

    /// Bind the configured address and serve until the listener fails.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr: SocketAddr = self.shared.config.bind_addr().parse()?;
        let listener = TcpListener::bind(addr).await?;
        self.serve(listener).await
    }

    /// Serve connections accepted on `listener`.
    pub async fn serve(
        self,
        listener: TcpListener,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        info!("Script server listening on {}", listener.local_addr()?);

        loop {
            let (stream, remote_addr) = listener.accept().await?;
            let io = TokioIo::new(stream);
            let shared = self.shared.clone();

            tokio::task::spawn(async move {
                let service = service_fn(move |req| {
                    let shared = shared.clone();
                    async move { handle_request(req, shared, remote_addr).await }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    error!("Error serving connection: {:?}", err);
                }
            });
        }
    }
}

/// Handle an incoming HTTP request.
async fn handle_request(
    req: Request<Incoming>,
    shared: Shared,
    remote_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let path = req.uri().path().to_string();
    debug!("Handling request: {} {} from {}", req.method(), path, remote_addr);

    if path == "/_health" {
        return Ok(build_response(ResponseInfo::new(StatusCode::OK).body("OK")));
    }

    if path == "/_scripts" {
        let scripts = shared.registry.list().await;
        let response = match serde_json::to_vec(&serde_json::json!({ "scripts": scripts })) {
            Ok(json) => ResponseInfo::new(StatusCode::OK)
                .header("Content-Type", "application/json")
                .body(json),
            Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };
        return Ok(build_response(response));
    }

    // Expected format: /{script_name}/...
    let trimmed = path.trim_start_matches('/');
    let (name, rest) = trimmed.split_once('/').unwrap_or((trimmed, ""));
    if name.is_empty() {
        return Ok(build_response(error_response(
            StatusCode::NOT_FOUND,
            "No script specified",
        )));
    }
    let name = name.to_string();
    let rest = format!("/{}", rest);

    let request = match convert_request(req, &rest, &shared.config).await {
        Ok(request) => request,
        Err(rejection) => {
            warn!(
                "Rejected request for '{}': {} {}",
                name,
                rejection.status.unwrap_or_default().0,
                rejection.text_body().unwrap_or_default()
            );
            return Ok(build_response(rejection));
        }
    };

    Ok(build_response(run_script(&shared, &name, request).await))
}

async fn run_script(shared: &Shared, name: &str, mut request: RequestInfo) -> ResponseInfo {
    let Some(script) = shared.registry.get(name).await else {
        return error_response(StatusCode::NOT_FOUND, format!("Script '{}' not found", name));
    };

    if request.id.is_empty() {
        request.id = generate_request_id();
    }
    let request_id = request.id.clone();

    let info = ScriptInfo {
        name: name.to_string(),
        start_time: now_millis(),
        script_type: script
            .manifest()
            .map(|m| m.script_type)
            .unwrap_or(ScriptType::HttpRequest),
    };
    let host = Arc::new(
        LocalHost::new(
            shared.config.clone(),
            shared.store.clone(),
            shared.client.clone(),
            info,
        )
        .with_request(request),
    );

    if let Err(e) = shared.registry.execute(name, host.clone()).await {
        error!("Script '{}' error: {} [{}]", name, e, request_id);
        return error_response(StatusCode(e.code), e.message);
    }

    match host.take_completion() {
        Some(Some(payload)) => completion_response(payload),
        Some(None) => ResponseInfo::new(StatusCode::OK),
        None => {
            warn!("Script '{}' returned without calling done [{}]", name, request_id);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Script '{}' finished without calling done", name),
            )
        }
    }
}

/// Convert a hyper request into the script's request snapshot.
///
/// The body is read through a length limit, so an oversized upload is
/// refused without being buffered in full.
async fn convert_request(
    req: Request<Incoming>,
    path: &str,
    config: &RuntimeConfig,
) -> Result<RequestInfo, ResponseInfo> {
    let (parts, body) = req.into_parts();
    let method = Method::try_from(&parts.method)
        .map_err(|e| error_response(StatusCode::METHOD_NOT_ALLOWED, e.to_string()))?;
    let authority = parts
        .headers
        .get(hyper::header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| config.bind_addr());
    let query = parts
        .uri
        .query()
        .map(|q| format!("?{}", q))
        .unwrap_or_default();

    let mut headers = HashMap::new();
    for (name, value) in &parts.headers {
        if let Ok(v) = value.to_str() {
            headers.insert(name.as_str().to_string(), v.to_string());
        }
    }

    let body_bytes = Limited::new(body, config.max_body_size)
        .collect()
        .await
        .map_err(|e| {
            if e.is::<LengthLimitError>() {
                error_response(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large")
            } else {
                error_response(StatusCode::BAD_REQUEST, e.to_string())
            }
        })?
        .to_bytes();
    let body = if body_bytes.is_empty() {
        None
    } else {
        Some(match std::str::from_utf8(&body_bytes) {
            Ok(text) => Body::Text(text.to_string()),
            Err(_) => Body::Binary(body_bytes),
        })
    };

    Ok(RequestInfo {
        url: format!("http://{}{}{}", authority, path, query),
        method,
        headers,
        body,
        id: generate_request_id(),
    })
}

/// Turn a completion payload into a response.
///
/// A nested `response` object takes precedence over top-level fields.
/// Header values that are not strings are rendered as JSON.
fn completion_response(payload: CompletionPayload) -> ResponseInfo {
    let payload = match payload.get("response") {
        Some(serde_json::Value::Object(inner)) => inner.clone(),
        _ => payload,
    };

    let status = payload
        .get("status")
        .and_then(serde_json::Value::as_u64)
        .and_then(|s| u16::try_from(s).ok())
        .unwrap_or(200);
    let mut response = ResponseInfo::new(status);

    if let Some(serde_json::Value::Object(headers)) = payload.get("headers") {
        for (name, value) in headers {
            let value = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            response = response.header(name.clone(), value);
        }
    }

    response.body = match payload.get("body") {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(Body::Text(s.clone())),
        Some(serde_json::Value::Array(items)) if items.iter().all(|v| v.as_u64().is_some_and(|b| b <= 255)) => {
            Some(Body::Binary(
                items
                    .iter()
                    .filter_map(|v| v.as_u64().map(|b| b as u8))
                    .collect::<Vec<u8>>()
                    .into(),
            ))
        }
        Some(other) => Some(Body::Text(other.to_string())),
    };
    response
}

fn error_response(status: StatusCode, message: impl Into<String>) -> ResponseInfo {
    ResponseInfo::new(status)
        .header("Content-Type", "text/plain")
        .body(Body::Text(message.into()))
}

/// Build a hyper response from a response snapshot.
fn build_response(response: ResponseInfo) -> Response<Full<Bytes>> {
    let code = response.status.unwrap_or_default().0;
    let status = hyper::StatusCode::from_u16(code).unwrap_or_else(|_| {
        warn!(
            "Invalid status code {}, falling back to 500 Internal Server Error",
            code
        );
        hyper::StatusCode::INTERNAL_SERVER_ERROR
    });

    let mut builder = Response::builder().status(status);
    for (name, value) in response.headers.unwrap_or_default() {
        builder = builder.header(name, value);
    }

    let body = response.body.map(Body::into_bytes).unwrap_or_default();
    builder.body(Full::new(body)).unwrap_or_else(|e| {
        warn!("Invalid response from script: {}", e);
        let mut fallback = Response::new(Full::new(Bytes::from_static(b"Invalid script response")));
        *fallback.status_mut() = hyper::StatusCode::INTERNAL_SERVER_ERROR;
        fallback
    })
}

/// Get current timestamp in milliseconds.
fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Generate a unique request ID.
fn generate_request_id() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("{:x}-{:x}", timestamp, COUNTER.fetch_add(1, Ordering::Relaxed))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(value: serde_json::Value) -> CompletionPayload {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_completion_with_body_and_headers() {
        let response = completion_response(payload(serde_json::json!({
            "body": "x",
            "headers": { "a": 1, "Content-Type": "text/plain" }
        })));
        assert_eq!(response.status, Some(StatusCode::OK));
        assert_eq!(response.get_header("a"), Some(&"1".to_string()));
        assert_eq!(response.text_body(), Some("x".to_string()));
    }

    #[test]
    fn test_nested_response_wins() {
        let response = completion_response(payload(serde_json::json!({
            "response": { "status": 403, "body": "denied" }
        })));
        assert_eq!(response.status, Some(StatusCode(403)));
        assert_eq!(response.text_body(), Some("denied".to_string()));
    }

    #[test]
    fn test_byte_array_body_is_binary() {
        let response = completion_response(payload(serde_json::json!({ "body": [0, 159, 255] })));
        assert_eq!(response.body, Some(Body::Binary(Bytes::from_static(&[0, 159, 255]))));
    }

    #[test]
    fn test_request_ids_are_unique() {
        assert_ne!(generate_request_id(), generate_request_id());
    }
}
