//! Signed bearer tokens for Apple services.
//!
//! This crate issues the two ES256-signed tokens Apple's services expect:
//! the long-lived Sign-in-with-Apple client secret and the short-lived
//! APNs provider authentication token. The provider token is cached and
//! refreshed per Apple's reuse guidance rather than re-signed per request.

#![warn(clippy::pedantic)]

/// Module for the token-side error taxonomy
pub mod error;

/// Module for signing key material
pub mod key;

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for compact-token (JWS) signing
pub mod signer;

/// Module for Sign-in-with-Apple client secret issuance
pub mod client_secret;

/// Module for the cached APNs provider token
pub mod provider_cache;

pub use client_secret::{ClientSecretConfig, ClientSecretIssuer, APPLE_ID_AUDIENCE};
pub use error::AuthError;
pub use key::SigningKey;
pub use provider_cache::{ProviderTokenCache, DEFAULT_REFRESH_THRESHOLD};
pub use signer::{Claims, Es256Signer, SignedToken, TokenPurpose, TokenSigner};
