//! Client-secret issuance tests moved out of the `client_secret` module:
//! they depend on `apns-test-utils`, which depends on `apple-auth`. As an
//! integration test they link the same `apple_auth` instance as the
//! fixtures, avoiding the dev-dependency-cycle two-version mismatch.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use apple_auth::error::AuthError;
use apple_auth::secret::ExposeSecret;
use apple_auth::{
    ClientSecretConfig, ClientSecretIssuer, TokenPurpose, APPLE_ID_AUDIENCE,
};
use apns_test_utils::assertions::{decode_claims, TokenAssertions};
use apns_test_utils::fixtures::{test_signing_key, TEST_KEY_ID, TEST_SERVICE_ID, TEST_TEAM_ID};
use apns_test_utils::stub_signer::CountingSigner;

    fn test_config() -> ClientSecretConfig {
        ClientSecretConfig::new(TEST_TEAM_ID, TEST_SERVICE_ID, TEST_KEY_ID)
    }

    #[test]
    fn test_issue_produces_expected_claims() {
        let key = test_signing_key();
        let config = test_config().with_validity_days(30);

        let token = ClientSecretIssuer::new().issue(&config, &key).unwrap();

        assert_eq!(token.purpose(), TokenPurpose::ClientSecret);
        token
            .value()
            .expose_secret()
            .assert_valid_jwt()
            .assert_signed_by(TEST_KEY_ID);

        let claims = decode_claims(token.value().expose_secret());
        assert_eq!(claims["iss"], TEST_TEAM_ID);
        assert_eq!(claims["sub"], TEST_SERVICE_ID);
        assert_eq!(claims["aud"], APPLE_ID_AUDIENCE);
        let lifetime = claims["exp"].as_i64().unwrap() - claims["iat"].as_i64().unwrap();
        assert_eq!(lifetime, 30 * 86_400);
    }

    #[test]
    fn test_default_validity_is_maximum() {
        let key = test_signing_key();
        let token = ClientSecretIssuer::new()
            .issue(&test_config(), &key)
            .unwrap();

        let claims = decode_claims(token.value().expose_secret());
        let lifetime = claims["exp"].as_i64().unwrap() - claims["iat"].as_i64().unwrap();
        assert_eq!(lifetime, 180 * 86_400);
    }

    #[test]
    fn test_validity_out_of_range_rejected_before_signing() {
        let key = test_signing_key();
        let signer = Arc::new(CountingSigner::new());
        let issuer = ClientSecretIssuer::with_signer(signer.clone());

        for days in [0u32, 181, 365] {
            let result = issuer.issue(&test_config().with_validity_days(days), &key);
            assert!(
                matches!(result, Err(AuthError::InvalidConfig(_))),
                "validity_days={days} should be rejected"
            );
        }

        assert_eq!(signer.calls(), 0, "no signing may happen for invalid config");
    }

    #[test]
    fn test_empty_identifiers_rejected() {
        let key = test_signing_key();
        let issuer = ClientSecretIssuer::new();

        let empty_service = ClientSecretConfig::new(TEST_TEAM_ID, "", TEST_KEY_ID);
        assert!(matches!(
            issuer.issue(&empty_service, &key),
            Err(AuthError::InvalidConfig(_))
        ));

        let empty_team = ClientSecretConfig::new("", TEST_SERVICE_ID, TEST_KEY_ID);
        assert!(matches!(
            issuer.issue(&empty_team, &key),
            Err(AuthError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_mismatched_key_identifiers_rejected() {
        let key = test_signing_key();
        let config = ClientSecretConfig::new(TEST_TEAM_ID, TEST_SERVICE_ID, "OTHERKEYID");

        let result = ClientSecretIssuer::new().issue(&config, &key);
        assert!(matches!(result, Err(AuthError::InvalidConfig(_))));
    }

    #[test]
    fn test_signer_errors_propagate_unchanged() {
        let key = test_signing_key();
        let signer = Arc::new(CountingSigner::failing_on([1]));
        let issuer = ClientSecretIssuer::with_signer(signer);

        let result = issuer.issue(&test_config(), &key);
        assert!(matches!(result, Err(AuthError::Signing(_))));
    }
