//! Notification options.

use crate::host::{NotificationWire, NotifyAction};
use serde::{Deserialize, Serialize};

/// Options for [`ProxyTool::notify`](crate::ProxyTool::notify).
///
/// Serialized with camelCase names (`mediaUrl`, `mediaBase64`,
/// `autoDismiss`); `media-base64-mime` keeps the host's own spelling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyOptions {
    /// Action performed when the notification is tapped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<NotifyAction>,
    /// URL opened by [`NotifyAction::OpenUrl`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Text copied by [`NotifyAction::Clipboard`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Media attachment given as a URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    /// Media attachment given inline as base64.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_base64: Option<String>,
    /// MIME type of `media_base64`.
    #[serde(
        rename = "media-base64-mime",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub media_base64_mime: Option<String>,
    /// Dismiss after this many seconds. The host keeps it forever on `0`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_dismiss: Option<u64>,
    /// Play the default notification sound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound: Option<bool>,
}

impl NotifyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open `url` when tapped.
    pub fn open_url(mut self, url: impl Into<String>) -> Self {
        self.action = Some(NotifyAction::OpenUrl);
        self.url = Some(url.into());
        self
    }

    /// Copy `text` to the clipboard when tapped.
    pub fn copy_text(mut self, text: impl Into<String>) -> Self {
        self.action = Some(NotifyAction::Clipboard);
        self.text = Some(text.into());
        self
    }

    pub fn media_url(mut self, url: impl Into<String>) -> Self {
        self.media_url = Some(url.into());
        self
    }

    /// Attach inline media with its MIME type.
    pub fn media_base64(mut self, data: impl Into<String>, mime: impl Into<String>) -> Self {
        self.media_base64 = Some(data.into());
        self.media_base64_mime = Some(mime.into());
        self
    }

    pub fn auto_dismiss(mut self, seconds: u64) -> Self {
        self.auto_dismiss = Some(seconds);
        self
    }

    pub fn sound(mut self, sound: bool) -> Self {
        self.sound = Some(sound);
        self
    }
}

impl From<NotifyOptions> for NotificationWire {
    fn from(options: NotifyOptions) -> Self {
        NotificationWire {
            action: options.action,
            url: options.url,
            text: options.text,
            media_url: options.media_url,
            media_base64: options.media_base64,
            media_base64_mime: options.media_base64_mime,
            auto_dismiss: options.auto_dismiss,
            sound: options.sound,
        }
    }
}
