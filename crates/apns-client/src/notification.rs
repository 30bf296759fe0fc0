//! Push notification requests and payloads.
//!
//! The wire format is Apple's: a JSON body whose required `aps` object
//! carries the alert/badge/sound fields, with arbitrary application keys
//! beside it at the top level, and delivery semantics expressed through
//! `apns-*` request headers.

use serde::Serialize;
use serde_json::{Map, Value};

/// Delivery priority (`apns-priority` header).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Priority {
    /// Deliver immediately (`10`). Not permitted for background pushes.
    #[default]
    Immediate,
    /// Deliver on a power-friendly schedule (`5`).
    PowerSaving,
}

impl Priority {
    /// Header value for this priority.
    #[must_use]
    pub fn header_value(self) -> &'static str {
        match self {
            Self::Immediate => "10",
            Self::PowerSaving => "5",
        }
    }
}

/// Kind of push (`apns-push-type` header).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PushType {
    /// User-visible alert.
    #[default]
    Alert,
    /// Silent content refresh; requires `content-available: 1`.
    Background,
    /// VoIP session push.
    Voip,
    /// Live Activity update.
    LiveActivity,
}

impl PushType {
    /// Header value for this push type.
    #[must_use]
    pub fn header_value(self) -> &'static str {
        match self {
            Self::Alert => "alert",
            Self::Background => "background",
            Self::Voip => "voip",
            Self::LiveActivity => "liveactivity",
        }
    }
}

/// The user-visible alert inside `aps`.
#[derive(Debug, Clone, Serialize, Default)]
pub struct Alert {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// The `aps` dictionary Apple interprets.
#[derive(Debug, Clone, Serialize, Default)]
pub struct Aps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<Alert>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,
    #[serde(rename = "mutable-content", skip_serializing_if = "Option::is_none")]
    pub mutable_content: Option<u8>,
    #[serde(rename = "content-available", skip_serializing_if = "Option::is_none")]
    pub content_available: Option<u8>,
}

/// A push payload: the required `aps` object plus application-defined
/// top-level keys delivered alongside it.
#[derive(Debug, Clone, Serialize)]
pub struct Payload {
    pub aps: Aps,
    #[serde(flatten)]
    pub custom: Map<String, Value>,
}

impl Payload {
    /// An alert payload with title and body.
    #[must_use]
    pub fn alert(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            aps: Aps {
                alert: Some(Alert {
                    title: Some(title.into()),
                    body: Some(body.into()),
                }),
                ..Aps::default()
            },
            custom: Map::new(),
        }
    }

    /// A silent background payload (`content-available: 1`, no alert).
    #[must_use]
    pub fn background() -> Self {
        Self {
            aps: Aps {
                content_available: Some(1),
                ..Aps::default()
            },
            custom: Map::new(),
        }
    }

    /// Set the app icon badge count.
    #[must_use]
    pub fn with_badge(mut self, badge: u32) -> Self {
        self.aps.badge = Some(badge);
        self
    }

    /// Set the notification sound.
    #[must_use]
    pub fn with_sound(mut self, sound: impl Into<String>) -> Self {
        self.aps.sound = Some(sound.into());
        self
    }

    /// Allow a notification service extension to rewrite the content.
    #[must_use]
    pub fn with_mutable_content(mut self) -> Self {
        self.aps.mutable_content = Some(1);
        self
    }

    /// Attach an application-defined top-level key.
    #[must_use]
    pub fn with_custom(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.custom.insert(key.into(), value.into());
        self
    }
}

/// One push to one device.
#[derive(Debug, Clone)]
pub struct PushRequest {
    /// Target device token, as hex.
    pub device_token: String,
    /// Bundle identifier (`apns-topic` header).
    pub topic: String,
    /// The JSON body.
    pub payload: Payload,
    /// Delivery priority.
    pub priority: Priority,
    /// Push type.
    pub push_type: PushType,
    /// `apns-expiration` header: Unix seconds until which APNs may retry
    /// delivery, or `0` for deliver-now-or-drop. Omitted when unset.
    pub expiration: Option<i64>,
}

impl PushRequest {
    /// Create an immediate alert push.
    #[must_use]
    pub fn new(
        device_token: impl Into<String>,
        topic: impl Into<String>,
        payload: Payload,
    ) -> Self {
        Self {
            device_token: device_token.into(),
            topic: topic.into(),
            payload,
            priority: Priority::default(),
            push_type: PushType::default(),
            expiration: None,
        }
    }

    /// Set the delivery priority.
    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Set the push type.
    #[must_use]
    pub fn with_push_type(mut self, push_type: PushType) -> Self {
        self.push_type = push_type;
        self
    }

    /// Set the `apns-expiration` header value.
    #[must_use]
    pub fn with_expiration(mut self, expiration: i64) -> Self {
        self.expiration = Some(expiration);
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_alert_payload_serializes_apple_shape() {
        let payload = Payload::alert("Reminder", "Event starts in one hour")
            .with_badge(1)
            .with_sound("default")
            .with_mutable_content();

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            value,
            json!({
                "aps": {
                    "alert": {
                        "title": "Reminder",
                        "body": "Event starts in one hour"
                    },
                    "badge": 1,
                    "sound": "default",
                    "mutable-content": 1
                }
            })
        );
    }

    #[test]
    fn test_custom_keys_flatten_beside_aps() {
        let payload = Payload::alert("t", "b")
            .with_custom("event_id", "evt-42")
            .with_custom("event_count", 3);

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["event_id"], "evt-42");
        assert_eq!(value["event_count"], 3);
        assert!(value["aps"]["alert"].is_object());
    }

    #[test]
    fn test_background_payload_has_content_available_only() {
        let value = serde_json::to_value(Payload::background()).unwrap();
        assert_eq!(value, json!({"aps": {"content-available": 1}}));
    }

    #[test]
    fn test_header_values() {
        assert_eq!(Priority::Immediate.header_value(), "10");
        assert_eq!(Priority::PowerSaving.header_value(), "5");
        assert_eq!(PushType::Alert.header_value(), "alert");
        assert_eq!(PushType::Background.header_value(), "background");
    }

    #[test]
    fn test_request_defaults() {
        let request = PushRequest::new("abcd", "com.example.app", Payload::alert("t", "b"));
        assert_eq!(request.priority, Priority::Immediate);
        assert_eq!(request.push_type, PushType::Alert);
        assert_eq!(request.expiration, None);
    }
}
