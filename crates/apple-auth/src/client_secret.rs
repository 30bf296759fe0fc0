//! Sign-in-with-Apple client secret issuance.
//!
//! Relying parties authenticate to Apple's identity service with a signed
//! JWT instead of a static password. The secret is long-lived (Apple caps it
//! at 180 days) and is typically pasted into a third-party auth provider's
//! console, so issuance here ends at returning the token string; delivering
//! or persisting it is the caller's concern.

use crate::error::AuthError;
use crate::key::SigningKey;
use crate::signer::{Claims, Es256Signer, SignedToken, TokenPurpose, TokenSigner};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument};

/// Audience claim Apple's identity service expects on a client secret.
pub const APPLE_ID_AUDIENCE: &str = "https://appleid.apple.com";

/// Shortest permitted client secret validity, in days.
pub const MIN_VALIDITY_DAYS: u32 = 1;

/// Longest client secret validity Apple accepts, in days.
pub const MAX_VALIDITY_DAYS: u32 = 180;

const SECONDS_PER_DAY: i64 = 86_400;

/// Parameters for one client secret.
///
/// `team_id` and `key_id` must match the [`SigningKey`] used at issuance;
/// `service_id` is the Service ID (client ID) registered for
/// Sign in with Apple.
#[derive(Debug, Clone)]
pub struct ClientSecretConfig {
    pub team_id: String,
    pub service_id: String,
    pub key_id: String,
    pub validity_days: u32,
}

impl ClientSecretConfig {
    /// Create a configuration with the maximum (180-day) validity.
    #[must_use]
    pub fn new(
        team_id: impl Into<String>,
        service_id: impl Into<String>,
        key_id: impl Into<String>,
    ) -> Self {
        Self {
            team_id: team_id.into(),
            service_id: service_id.into(),
            key_id: key_id.into(),
            validity_days: MAX_VALIDITY_DAYS,
        }
    }

    /// Set the validity period in days (must stay within [1, 180]).
    #[must_use]
    pub fn with_validity_days(mut self, days: u32) -> Self {
        self.validity_days = days;
        self
    }

    fn validate(&self, key: &SigningKey) -> Result<(), AuthError> {
        if self.team_id.is_empty() || self.service_id.is_empty() || self.key_id.is_empty() {
            return Err(AuthError::InvalidConfig(
                "team_id, service_id, and key_id must be non-empty".to_string(),
            ));
        }
        if self.validity_days < MIN_VALIDITY_DAYS || self.validity_days > MAX_VALIDITY_DAYS {
            return Err(AuthError::InvalidConfig(format!(
                "validity_days must be within [{MIN_VALIDITY_DAYS}, {MAX_VALIDITY_DAYS}], got {}",
                self.validity_days
            )));
        }
        if self.team_id != key.team_id() || self.key_id != key.key_id() {
            return Err(AuthError::InvalidConfig(
                "configuration identifiers do not match the signing key".to_string(),
            ));
        }
        Ok(())
    }
}

/// Issues Sign-in-with-Apple client secrets.
pub struct ClientSecretIssuer {
    signer: Arc<dyn TokenSigner>,
}

impl ClientSecretIssuer {
    /// Create an issuer backed by the production ES256 signer.
    #[must_use]
    pub fn new() -> Self {
        Self::with_signer(Arc::new(Es256Signer::new()))
    }

    /// Create an issuer backed by a caller-supplied signer.
    #[must_use]
    pub fn with_signer(signer: Arc<dyn TokenSigner>) -> Self {
        Self { signer }
    }

    /// Issue a client secret for `config`, signed with `key`.
    ///
    /// Claim set: `iss` = team ID, `iat` = now, `exp` = now + validity,
    /// `aud` = [`APPLE_ID_AUDIENCE`], `sub` = Service ID.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidConfig`] if the validity period is out of range,
    ///   an identifier is empty, or the config and key identifiers disagree.
    ///   Rejected before any signing work.
    /// - [`AuthError::KeyFormat`] / [`AuthError::Signing`] propagated
    ///   unchanged from the signer.
    #[instrument(skip_all, fields(key_id = %config.key_id))]
    pub fn issue(
        &self,
        config: &ClientSecretConfig,
        key: &SigningKey,
    ) -> Result<SignedToken, AuthError> {
        config.validate(key)?;

        let issued_at = Utc::now();
        let expires_at =
            issued_at + chrono::Duration::seconds(i64::from(config.validity_days) * SECONDS_PER_DAY);
        let claims = Claims::client_secret(
            &config.team_id,
            &config.service_id,
            APPLE_ID_AUDIENCE,
            issued_at,
            expires_at,
        );

        let token = self.signer.sign(key, &claims, TokenPurpose::ClientSecret)?;

        info!(
            target: "apple_auth.client_secret",
            key_id = %config.key_id,
            validity_days = config.validity_days,
            expires_at = %token.expires_at(),
            "Client secret issued"
        );

        Ok(token)
    }
}

impl Default for ClientSecretIssuer {
    fn default() -> Self {
        Self::new()
    }
}

