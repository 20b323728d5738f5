//! Option records in the host's hyphenated key convention.
//!
//! The facade's option types are converted into these at the call
//! boundary; a host receives nothing else. Absent options are left out
//! of the serialized record so the host applies its own defaults.

use crate::http::Method;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What happens when the user taps a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotifyAction {
    /// Open the URL given in the `url` option.
    OpenUrl,
    /// Copy the `text` option to the clipboard (the user confirms).
    Clipboard,
}

/// Notification options as the host reads them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<NotifyAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(rename = "media-url", default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    #[serde(rename = "media-base64", default, skip_serializing_if = "Option::is_none")]
    pub media_base64: Option<String>,
    #[serde(
        rename = "media-base64-mime",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub media_base64_mime: Option<String>,
    /// Seconds before the notification is dismissed; `0` keeps it.
    #[serde(rename = "auto-dismiss", default, skip_serializing_if = "Option::is_none")]
    pub auto_dismiss: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound: Option<bool>,
}

/// Request data handed to the host HTTP client.
///
/// Structured values are not serialized here; the host does that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Text(String),
    Binary(Bytes),
    Json(serde_json::Value),
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_string())
    }
}

impl From<Bytes> for Payload {
    fn from(bytes: Bytes) -> Self {
        Payload::Binary(bytes)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Payload::Binary(Bytes::from(bytes))
    }
}

impl From<serde_json::Value> for Payload {
    fn from(value: serde_json::Value) -> Self {
        Payload::Json(value)
    }
}

/// Request record passed to a method handle of the host HTTP client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HttpClientRequest {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Payload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<Method>,
    /// Timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    /// Skip TLS certificate validation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,
    #[serde(rename = "auto-cookie", default, skip_serializing_if = "Option::is_none")]
    pub auto_cookie: Option<bool>,
    #[serde(rename = "auto-redirect", default, skip_serializing_if = "Option::is_none")]
    pub auto_redirect: Option<bool>,
    #[serde(rename = "binary-mode", default, skip_serializing_if = "Option::is_none")]
    pub binary_mode: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_notification_wire_is_empty_record() {
        let json = serde_json::to_value(NotificationWire::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }

    #[test]
    fn test_action_kebab_case() {
        let wire = NotificationWire {
            action: Some(NotifyAction::OpenUrl),
            url: Some("https://example.com".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&wire).unwrap();
        assert_eq!(json["action"], "open-url");
        assert_eq!(json["url"], "https://example.com");
    }

    #[test]
    fn test_payload_keeps_structured_value() {
        let payload = Payload::from(serde_json::json!({ "a": 1 }));
        let request = HttpClientRequest {
            url: "http://example.com".to_string(),
            body: Some(payload),
            ..Default::default()
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["body"], serde_json::json!({ "a": 1 }));
    }
}
