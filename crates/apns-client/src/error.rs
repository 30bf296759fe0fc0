//! Error types for push dispatch.

use apple_auth::AuthError;
use thiserror::Error;

/// Errors that can occur while dispatching a push notification.
///
/// HTTP-level rejections from APNs are not errors at this level: they come
/// back as a [`PushResult`](crate::response::PushResult) with
/// `accepted: false` and the parsed reason, so the caller can distinguish
/// "Apple said no" from "we never got an answer".
#[derive(Error, Debug)]
pub enum PushError {
    /// Obtaining or signing the provider token failed.
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// The HTTP client could not be constructed.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Connection-level failure (refused, DNS, timeout) that survived the
    /// retry budget. No HTTP status exists for these.
    #[error("Network error: {0}")]
    Network(String),
}
