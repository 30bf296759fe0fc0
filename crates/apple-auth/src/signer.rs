//! ES256 compact-token signing.
//!
//! Apple's services authenticate callers with ES256-signed JWTs: three
//! base64url segments (header, claims, signature) joined by periods, signed
//! with ECDSA over P-256 and a SHA-256 digest. [`Es256Signer`] produces them
//! from a [`SigningKey`](crate::key::SigningKey) and a [`Claims`] set.
//!
//! Signing is pure computation: no I/O, no shared state. ECDSA signatures
//! are randomized, so signing the same claims twice yields different token
//! strings that both verify against the public key.

use crate::error::AuthError;
use crate::key::SigningKey;
use crate::secret::SecretString;
use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;
use std::fmt;
use tracing::instrument;

/// Validity Apple assigns to a provider token that carries no `exp` claim
/// (one hour, derived from `iat`).
pub const PROVIDER_TOKEN_VALIDITY_SECS: i64 = 3600;

/// What a signed token is for.
///
/// The two purposes differ in claim set and lifetime, not in signature
/// mechanics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPurpose {
    /// Sign-in-with-Apple client secret (up to 180 days).
    ClientSecret,
    /// APNs provider authentication token (one hour).
    ProviderAuth,
}

/// JWT claim set for Apple tokens.
///
/// Absent optional claims are omitted from the serialized JSON entirely;
/// Apple rejects explicit nulls. The `sub` field carries the Service ID and
/// is redacted in Debug output.
#[derive(Clone, Serialize)]
pub struct Claims {
    /// Issuer: the Apple developer team ID.
    pub iss: String,
    /// Issued-at, Unix seconds.
    pub iat: i64,
    /// Expiration, Unix seconds. Absent on provider tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    /// Audience. Present only on client secrets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    /// Subject: the Service ID. Present only on client secrets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
}

impl Claims {
    /// Claim set for an APNs provider token: `iss` and `iat` only.
    ///
    /// Apple derives the token's validity window from `iat`; an `exp` claim
    /// is not part of the contract.
    #[must_use]
    pub fn provider(team_id: &str, issued_at: DateTime<Utc>) -> Self {
        Self {
            iss: team_id.to_string(),
            iat: issued_at.timestamp(),
            exp: None,
            aud: None,
            sub: None,
        }
    }

    /// Claim set for a Sign-in-with-Apple client secret.
    #[must_use]
    pub fn client_secret(
        team_id: &str,
        service_id: &str,
        audience: &str,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            iss: team_id.to_string(),
            iat: issued_at.timestamp(),
            exp: Some(expires_at.timestamp()),
            aud: Some(audience.to_string()),
            sub: Some(service_id.to_string()),
        }
    }
}

impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("iss", &self.iss)
            .field("iat", &self.iat)
            .field("exp", &self.exp)
            .field("aud", &self.aud)
            .field("sub", &self.sub.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// A signed compact token plus the metadata callers need to reason about
/// its lifetime. Created by a [`TokenSigner`]; never mutated.
#[derive(Debug, Clone)]
pub struct SignedToken {
    value: SecretString,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    purpose: TokenPurpose,
}

impl SignedToken {
    /// Assemble a signed token. Intended for [`TokenSigner`] implementations;
    /// `expires_at` must be strictly after `issued_at`.
    #[must_use]
    pub fn new(
        value: SecretString,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        purpose: TokenPurpose,
    ) -> Self {
        Self {
            value,
            issued_at,
            expires_at,
            purpose,
        }
    }

    /// The compact three-segment token string.
    #[must_use]
    pub fn value(&self) -> &SecretString {
        &self.value
    }

    /// When the token was issued.
    #[must_use]
    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// When the token stops being accepted.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// What the token is for.
    #[must_use]
    pub fn purpose(&self) -> TokenPurpose {
        self.purpose
    }
}

/// Produces signed tokens from key material and a claim set.
///
/// The trait exists so issuance and caching logic can be exercised against
/// stub signers in tests; production code uses [`Es256Signer`].
pub trait TokenSigner: Send + Sync {
    /// Sign `claims` with `key`, producing a compact token.
    ///
    /// # Errors
    ///
    /// - [`AuthError::KeyFormat`] if the key material is not a parseable
    ///   P-256 private key.
    /// - [`AuthError::Signing`] if the signature operation itself fails.
    /// - [`AuthError::InvalidConfig`] if the claim timestamps are not a
    ///   well-formed validity window.
    fn sign(
        &self,
        key: &SigningKey,
        claims: &Claims,
        purpose: TokenPurpose,
    ) -> Result<SignedToken, AuthError>;
}

/// The production signer: ECDSA over P-256 with SHA-256 (`alg: ES256`).
#[derive(Debug, Clone, Copy, Default)]
pub struct Es256Signer;

impl Es256Signer {
    /// Create a signer. Stateless; a single instance can be shared freely.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl TokenSigner for Es256Signer {
    #[instrument(skip_all, fields(kid = %key.key_id()))]
    fn sign(
        &self,
        key: &SigningKey,
        claims: &Claims,
        purpose: TokenPurpose,
    ) -> Result<SignedToken, AuthError> {
        use crate::secret::ExposeSecret;

        let encoding_key = EncodingKey::from_ec_pem(key.private_key_pem().expose_secret().as_bytes())
            .map_err(|e| AuthError::KeyFormat(format!("not a valid P-256 private key: {e}")))?;

        let mut header = Header::new(Algorithm::ES256);
        header.typ = Some("JWT".to_string());
        header.kid = Some(key.key_id().to_string());

        let value = encode(&header, claims, &encoding_key)
            .map_err(|e| AuthError::Signing(format!("ES256 signing operation failed: {e}")))?;

        let issued_at = DateTime::from_timestamp(claims.iat, 0)
            .ok_or_else(|| AuthError::InvalidConfig(format!("iat out of range: {}", claims.iat)))?;
        let expires_at = match claims.exp {
            Some(exp) => DateTime::from_timestamp(exp, 0)
                .ok_or_else(|| AuthError::InvalidConfig(format!("exp out of range: {exp}")))?,
            None => issued_at + chrono::Duration::seconds(PROVIDER_TOKEN_VALIDITY_SECS),
        };

        if expires_at <= issued_at {
            return Err(AuthError::InvalidConfig(format!(
                "token would expire at or before issuance (iat={issued_at}, exp={expires_at})"
            )));
        }

        Ok(SignedToken::new(
            SecretString::from(value),
            issued_at,
            expires_at,
            purpose,
        ))
    }
}

