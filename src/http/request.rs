//! Request snapshot and the shared body type.

use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// HTTP method enumeration.
///
/// Serialized upper-case; any case is accepted when deserializing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl Method {
    /// Name of the host client handle serving this method (`"get"`, `"post"`, ...).
    pub fn host_key(&self) -> &'static str {
        match self {
            Method::Get => "get",
            Method::Post => "post",
            Method::Put => "put",
            Method::Delete => "delete",
            Method::Patch => "patch",
            Method::Head => "head",
            Method::Options => "options",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
            Method::Put => write!(f, "PUT"),
            Method::Delete => write!(f, "DELETE"),
            Method::Patch => write!(f, "PATCH"),
            Method::Head => write!(f, "HEAD"),
            Method::Options => write!(f, "OPTIONS"),
        }
    }
}

/// Error returned when a method name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported HTTP method: {0}")]
pub struct UnknownMethod(pub String);

impl FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(Method::Get),
            "post" => Ok(Method::Post),
            "put" => Ok(Method::Put),
            "delete" => Ok(Method::Delete),
            "patch" => Ok(Method::Patch),
            "head" => Ok(Method::Head),
            "options" => Ok(Method::Options),
            _ => Err(UnknownMethod(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for Method {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

impl TryFrom<&hyper::Method> for Method {
    type Error = UnknownMethod;

    fn try_from(method: &hyper::Method) -> Result<Self, Self::Error> {
        match *method {
            hyper::Method::GET => Ok(Method::Get),
            hyper::Method::POST => Ok(Method::Post),
            hyper::Method::PUT => Ok(Method::Put),
            hyper::Method::DELETE => Ok(Method::Delete),
            hyper::Method::PATCH => Ok(Method::Patch),
            hyper::Method::HEAD => Ok(Method::Head),
            hyper::Method::OPTIONS => Ok(Method::Options),
            _ => Err(UnknownMethod(method.as_str().to_string())),
        }
    }
}

impl From<Method> for hyper::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => hyper::Method::GET,
            Method::Post => hyper::Method::POST,
            Method::Put => hyper::Method::PUT,
            Method::Delete => hyper::Method::DELETE,
            Method::Patch => hyper::Method::PATCH,
            Method::Head => hyper::Method::HEAD,
            Method::Options => hyper::Method::OPTIONS,
        }
    }
}

/// A request or response body as the host hands it over.
///
/// Text bodies are UTF-8 decoded by the host; binary bodies are delivered
/// untouched when the host was asked for binary mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Body {
    Text(String),
    Binary(Bytes),
}

impl Body {
    /// Raw bytes of the body.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Body::Text(text) => text.as_bytes(),
            Body::Binary(bytes) => bytes,
        }
    }

    /// The body as text, lossily decoding binary content.
    pub fn text(&self) -> String {
        match self {
            Body::Text(text) => text.clone(),
            Body::Binary(bytes) => String::from_utf8_lossy(bytes).to_string(),
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, Body::Binary(_))
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Convert into owned bytes.
    pub fn into_bytes(self) -> Bytes {
        match self {
            Body::Text(text) => Bytes::from(text),
            Body::Binary(bytes) => bytes,
        }
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Text(text)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body::Text(text.to_string())
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Body::Binary(bytes)
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Body::Binary(Bytes::from(bytes))
    }
}

/// Snapshot of the request a script is attached to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestInfo {
    /// Request URL.
    pub url: String,
    /// HTTP method.
    pub method: Method,
    /// HTTP headers.
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Request body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Body>,
    /// Correlation id shared by every script invocation acting on this request.
    #[serde(default)]
    pub id: String,
}

impl RequestInfo {
    /// Create a new request snapshot.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            headers: HashMap::new(),
            body: None,
            id: String::new(),
        }
    }

    /// Add a header to the request.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set the request body.
    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set the correlation id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Get a header value, ignoring ASCII case of the name.
    pub fn get_header(&self, key: &str) -> Option<&String> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value)
    }

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

impl Default for RequestInfo {
    fn default() -> Self {
        Self::new(Method::Get, "/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_host_key_is_lowercase() {
        assert_eq!(Method::Get.host_key(), "get");
        assert_eq!(Method::Delete.host_key(), "delete");
        assert_eq!(Method::Options.host_key(), "options");
    }

    #[test]
    fn test_method_from_str_ignores_case() {
        assert_eq!("post".parse::<Method>().unwrap(), Method::Post);
        assert_eq!("PATCH".parse::<Method>().unwrap(), Method::Patch);
        assert!("brew".parse::<Method>().is_err());
    }

    #[test]
    fn test_method_deserializes_in_any_case() {
        let lower: Method = serde_json::from_str("\"post\"").unwrap();
        let upper: Method = serde_json::from_str("\"POST\"").unwrap();
        assert_eq!(lower, Method::Post);
        assert_eq!(upper, Method::Post);
        assert_eq!(serde_json::to_string(&Method::Post).unwrap(), "\"POST\"");
        assert!(serde_json::from_str::<Method>("\"brew\"").is_err());
    }

    #[test]
    fn test_unlisted_hyper_methods_are_rejected() {
        assert_eq!(Method::try_from(&hyper::Method::DELETE), Ok(Method::Delete));
        assert_eq!(
            Method::try_from(&hyper::Method::TRACE),
            Err(UnknownMethod("TRACE".to_string()))
        );
        assert!(Method::try_from(&hyper::Method::CONNECT).is_err());
    }

    #[test]
    fn test_body_untagged_serde() {
        let text: Body = serde_json::from_str("\"hello\"").unwrap();
        assert_eq!(text, Body::Text("hello".to_string()));

        let binary = Body::from(vec![1u8, 2, 3]);
        assert!(binary.is_binary());
        assert_eq!(binary.as_bytes(), &[1, 2, 3]);
    }

    #[test]
    fn test_get_header_case_insensitive() {
        let request = RequestInfo::new(Method::Get, "http://example.com")
            .header("content-type", "text/plain");
        assert_eq!(
            request.get_header("Content-Type"),
            Some(&"text/plain".to_string())
        );
        assert_eq!(request.get_header("accept"), None);
    }
}
