//! Classification of APNs responses.
//!
//! APNs answers a rejected push with a non-200 status and a JSON body whose
//! `reason` field names the failure. Reasons split into transient ones worth
//! retrying and terminal ones that will keep failing until the caller fixes
//! something.

use serde::Deserialize;

/// A `reason` string from an APNs error response.
///
/// Known reasons get their own variant; anything else is preserved verbatim
/// in [`ErrorReason::Other`] so new server-side reasons survive a round trip
/// to the caller unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorReason {
    /// The device token is not valid for the environment sent against.
    BadDeviceToken,
    /// The device token does not match the topic.
    DeviceTokenNotForTopic,
    /// The provider token is older than Apple's one-hour limit.
    ExpiredProviderToken,
    /// The provider token failed verification.
    InvalidProviderToken,
    /// No authorization header was sent.
    MissingProviderToken,
    /// No `apns-topic` header was sent.
    MissingTopic,
    /// The key lacks permission for the topic.
    TopicDisallowed,
    /// The device token is no longer active for the topic.
    Unregistered,
    /// The payload was empty.
    PayloadEmpty,
    /// The payload exceeded the size limit.
    PayloadTooLarge,
    /// Too many requests for the same device token.
    TooManyRequests,
    /// APNs internal error.
    InternalServerError,
    /// APNs is unavailable.
    ServiceUnavailable,
    /// APNs is shutting down the connection.
    Shutdown,
    /// The request timed out server-side.
    Timeout,
    /// Any reason this client does not know by name, verbatim.
    Other(String),
}

impl ErrorReason {
    /// Parse a reason string.
    #[must_use]
    pub fn from_reason(reason: &str) -> Self {
        match reason {
            "BadDeviceToken" => Self::BadDeviceToken,
            "DeviceTokenNotForTopic" => Self::DeviceTokenNotForTopic,
            "ExpiredProviderToken" => Self::ExpiredProviderToken,
            "InvalidProviderToken" => Self::InvalidProviderToken,
            "MissingProviderToken" => Self::MissingProviderToken,
            "MissingTopic" => Self::MissingTopic,
            "TopicDisallowed" => Self::TopicDisallowed,
            "Unregistered" => Self::Unregistered,
            "PayloadEmpty" => Self::PayloadEmpty,
            "PayloadTooLarge" => Self::PayloadTooLarge,
            "TooManyRequests" => Self::TooManyRequests,
            "InternalServerError" => Self::InternalServerError,
            "ServiceUnavailable" => Self::ServiceUnavailable,
            "Shutdown" => Self::Shutdown,
            "Timeout" => Self::Timeout,
            other => Self::Other(other.to_string()),
        }
    }

    /// The reason string as APNs sent it.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::BadDeviceToken => "BadDeviceToken",
            Self::DeviceTokenNotForTopic => "DeviceTokenNotForTopic",
            Self::ExpiredProviderToken => "ExpiredProviderToken",
            Self::InvalidProviderToken => "InvalidProviderToken",
            Self::MissingProviderToken => "MissingProviderToken",
            Self::MissingTopic => "MissingTopic",
            Self::TopicDisallowed => "TopicDisallowed",
            Self::Unregistered => "Unregistered",
            Self::PayloadEmpty => "PayloadEmpty",
            Self::PayloadTooLarge => "PayloadTooLarge",
            Self::TooManyRequests => "TooManyRequests",
            Self::InternalServerError => "InternalServerError",
            Self::ServiceUnavailable => "ServiceUnavailable",
            Self::Shutdown => "Shutdown",
            Self::Timeout => "Timeout",
            Self::Other(reason) => reason,
        }
    }

    /// Whether a retry of the same request can plausibly succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::InternalServerError | Self::ServiceUnavailable | Self::Timeout
        )
    }
}

impl std::fmt::Display for ErrorReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one push send.
#[derive(Debug, Clone)]
pub struct PushResult {
    /// Whether APNs accepted the notification.
    pub accepted: bool,
    /// The `apns-id` response header, when present.
    pub apns_id: Option<String>,
    /// HTTP status of the final response.
    pub http_status: u16,
    /// Parsed rejection reason, when not accepted.
    pub error_reason: Option<ErrorReason>,
}

impl PushResult {
    pub(crate) fn accepted(http_status: u16, apns_id: Option<String>) -> Self {
        Self {
            accepted: true,
            apns_id,
            http_status,
            error_reason: None,
        }
    }

    pub(crate) fn rejected(http_status: u16, error_reason: Option<ErrorReason>) -> Self {
        Self {
            accepted: false,
            apns_id: None,
            http_status,
            error_reason,
        }
    }
}

/// Error body APNs sends with non-200 responses.
#[derive(Debug, Deserialize)]
struct ApnsErrorBody {
    reason: String,
    #[allow(dead_code)]
    #[serde(default)]
    timestamp: Option<i64>,
}

/// Parse the `reason` field out of an APNs error body, if there is one.
pub(crate) fn parse_error_body(body: &str) -> Option<ErrorReason> {
    serde_json::from_str::<ApnsErrorBody>(body)
        .ok()
        .map(|parsed| ErrorReason::from_reason(&parsed.reason))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_known_reason_round_trips() {
        let reason = ErrorReason::from_reason("BadDeviceToken");
        assert_eq!(reason, ErrorReason::BadDeviceToken);
        assert_eq!(reason.as_str(), "BadDeviceToken");
    }

    #[test]
    fn test_unknown_reason_preserved_verbatim() {
        let reason = ErrorReason::from_reason("SomeFutureReason");
        assert_eq!(reason, ErrorReason::Other("SomeFutureReason".to_string()));
        assert_eq!(reason.as_str(), "SomeFutureReason");
    }

    #[test]
    fn test_transient_classification() {
        assert!(ErrorReason::InternalServerError.is_transient());
        assert!(ErrorReason::ServiceUnavailable.is_transient());
        assert!(ErrorReason::Timeout.is_transient());

        assert!(!ErrorReason::BadDeviceToken.is_transient());
        assert!(!ErrorReason::ExpiredProviderToken.is_transient());
        assert!(!ErrorReason::TopicDisallowed.is_transient());
        assert!(!ErrorReason::PayloadTooLarge.is_transient());
        assert!(!ErrorReason::Other("Unknown".to_string()).is_transient());
    }

    #[test]
    fn test_parse_error_body() {
        let reason = parse_error_body(r#"{"reason":"Unregistered","timestamp":1700000000}"#);
        assert_eq!(reason, Some(ErrorReason::Unregistered));

        assert_eq!(parse_error_body("not json"), None);
        assert_eq!(parse_error_body(""), None);
        assert_eq!(parse_error_body("{}"), None);
    }
}
