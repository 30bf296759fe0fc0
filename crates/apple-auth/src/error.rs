//! Error types for token issuance.

use thiserror::Error;

/// Errors that can occur while building or signing a token.
///
/// All variants are fatal for the call that produced them: none of them is
/// retried inside this crate, and the decision to abort or try again belongs
/// to the caller.
#[derive(Error, Debug, Clone)]
pub enum AuthError {
    /// Private key material could not be parsed as a P-256 key.
    #[error("Invalid signing key: {0}")]
    KeyFormat(String),

    /// The underlying cryptographic signing operation failed.
    #[error("Token signing failed: {0}")]
    Signing(String),

    /// Caller-supplied parameters violate the contract (rejected before any
    /// signing or I/O).
    #[error("Configuration error: {0}")]
    InvalidConfig(String),
}
