//! Completion argument for [`ProxyTool::done`](crate::ProxyTool::done).

use crate::host::CompletionPayload;
use std::collections::HashMap;

/// What a script hands back when it finishes.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Completion {
    /// Plain completion without payload.
    #[default]
    Empty,
    /// Only a body. Sent as `{ "body": ... }`.
    Body(String),
    /// A full payload (`body`, `headers`, ...) sent unchanged.
    Object(CompletionPayload),
}

impl Completion {
    /// Build an object payload from a body and headers.
    pub fn with_headers(body: impl Into<String>, headers: HashMap<String, String>) -> Self {
        let mut payload = CompletionPayload::new();
        payload.insert("body".to_string(), serde_json::Value::String(body.into()));
        payload.insert(
            "headers".to_string(),
            serde_json::Value::Object(
                headers
                    .into_iter()
                    .map(|(k, v)| (k, serde_json::Value::String(v)))
                    .collect(),
            ),
        );
        Completion::Object(payload)
    }

    /// The payload the host receives. An empty body counts as no argument.
    pub fn into_payload(self) -> Option<CompletionPayload> {
        match self {
            Completion::Empty => None,
            Completion::Body(body) if body.is_empty() => None,
            Completion::Body(body) => {
                let mut payload = CompletionPayload::new();
                payload.insert("body".to_string(), serde_json::Value::String(body));
                Some(payload)
            }
            Completion::Object(payload) => Some(payload),
        }
    }
}

impl From<()> for Completion {
    fn from(_: ()) -> Self {
        Completion::Empty
    }
}

impl From<&str> for Completion {
    fn from(body: &str) -> Self {
        Completion::Body(body.to_string())
    }
}

impl From<String> for Completion {
    fn from(body: String) -> Self {
        Completion::Body(body)
    }
}

impl From<CompletionPayload> for Completion {
    fn from(payload: CompletionPayload) -> Self {
        Completion::Object(payload)
    }
}

impl<T: Into<Completion>> From<Option<T>> for Completion {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_is_wrapped() {
        let payload = Completion::from("ok").into_payload().unwrap();
        assert_eq!(serde_json::Value::Object(payload), serde_json::json!({ "body": "ok" }));
    }

    #[test]
    fn test_empty_string_means_no_payload() {
        assert_eq!(Completion::from("").into_payload(), None);
        assert_eq!(Completion::from(()).into_payload(), None);
        assert_eq!(Completion::from(None::<String>).into_payload(), None);
    }

    #[test]
    fn test_with_headers_builds_object() {
        let headers = HashMap::from([("X-A".to_string(), "1".to_string())]);
        let payload = Completion::with_headers("x", headers).into_payload().unwrap();
        assert_eq!(
            serde_json::Value::Object(payload),
            serde_json::json!({ "body": "x", "headers": { "X-A": "1" } })
        );
    }
}
