//! Custom test assertions for expressive tests
//!
//! Provides trait-based structural assertions over compact tokens. These
//! decode the base64url segments directly and do not verify signatures;
//! signature verification belongs to the crypto round-trip tests.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Deserialize;

/// JWT header structure
#[derive(Debug, Deserialize)]
struct JwtHeader {
    pub alg: String,
    pub typ: String,
    #[serde(default)]
    pub kid: Option<String>,
}

/// Decode the claims segment of a compact token into JSON.
///
/// # Panics
///
/// Panics (fails the test) when the token is not three base64url segments
/// of valid JSON.
#[must_use]
pub fn decode_claims(token: &str) -> serde_json::Value {
    let parts: Vec<_> = token.split('.').collect();
    assert_eq!(parts.len(), 3, "expected a three-segment compact token");

    let payload = URL_SAFE_NO_PAD
        .decode(parts[1])
        .expect("claims segment must be base64url");
    serde_json::from_slice(&payload).expect("claims segment must be JSON")
}

/// Custom assertions for signed tokens
///
/// # Example
/// ```rust,ignore
/// token
///     .assert_valid_jwt()
///     .assert_signed_by("DEF456GHIJ");
/// ```
pub trait TokenAssertions {
    /// Assert the token is a structurally valid ES256 JWT
    fn assert_valid_jwt(&self) -> &Self;

    /// Assert the token header names the given key ID
    fn assert_signed_by(&self, key_id: &str) -> &Self;

    /// Assert a claim is present and equal to the given JSON value
    fn assert_claim(&self, name: &str, expected: &serde_json::Value) -> &Self;
}

impl TokenAssertions for str {
    fn assert_valid_jwt(&self) -> &Self {
        let parts: Vec<_> = self.split('.').collect();
        assert_eq!(
            parts.len(),
            3,
            "JWT must have 3 parts (header.payload.signature), got {}",
            parts.len()
        );

        let header_bytes = URL_SAFE_NO_PAD
            .decode(parts[0])
            .expect("failed to base64 decode JWT header");
        let header: JwtHeader =
            serde_json::from_slice(&header_bytes).expect("failed to parse JWT header JSON");

        assert_eq!(header.alg, "ES256", "expected ES256 algorithm");
        assert_eq!(header.typ, "JWT", "expected JWT type");

        let payload_bytes = URL_SAFE_NO_PAD
            .decode(parts[1])
            .expect("failed to base64 decode JWT payload");
        let _: serde_json::Value =
            serde_json::from_slice(&payload_bytes).expect("failed to parse JWT claims JSON");

        assert!(!parts[2].is_empty(), "signature segment must be non-empty");

        self
    }

    fn assert_signed_by(&self, key_id: &str) -> &Self {
        let parts: Vec<_> = self.split('.').collect();
        let header_bytes = URL_SAFE_NO_PAD
            .decode(parts[0])
            .expect("invalid JWT header");
        let header: JwtHeader =
            serde_json::from_slice(&header_bytes).expect("failed to parse JWT header");

        assert_eq!(
            header.kid.as_deref(),
            Some(key_id),
            "expected key_id '{}', got {:?}",
            key_id,
            header.kid
        );

        self
    }

    fn assert_claim(&self, name: &str, expected: &serde_json::Value) -> &Self {
        let claims = decode_claims(self);
        assert_eq!(
            claims.get(name),
            Some(expected),
            "claim '{name}' mismatch in {claims}"
        );

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apple_auth::secret::ExposeSecret;
    use apple_auth::{Claims, Es256Signer, TokenPurpose, TokenSigner};
    use crate::fixtures::{test_signing_key, TEST_KEY_ID, TEST_TEAM_ID};

    fn signed_token() -> String {
        let token = Es256Signer::new()
            .sign(
                &test_signing_key(),
                &Claims::provider(TEST_TEAM_ID, chrono_now()),
                TokenPurpose::ProviderAuth,
            )
            .expect("fixture key must sign");
        token.value().expose_secret().to_string()
    }

    fn chrono_now() -> chrono::DateTime<chrono::Utc> {
        chrono::Utc::now()
    }

    #[test]
    fn test_assertions_pass_for_real_token() {
        let token = signed_token();
        token
            .as_str()
            .assert_valid_jwt()
            .assert_signed_by(TEST_KEY_ID)
            .assert_claim("iss", &serde_json::json!(TEST_TEAM_ID));
    }

    #[test]
    #[should_panic(expected = "JWT must have 3 parts")]
    fn test_malformed_token_fails_assertion() {
        "not-a-jwt".assert_valid_jwt();
    }
}
