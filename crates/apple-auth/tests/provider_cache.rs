//! Provider-token cache tests moved out of the `provider_cache` module:
//! they depend on `apns-test-utils`, which depends on `apple-auth`. As an
//! integration test they link the same `apple_auth` instance as the
//! fixtures, avoiding the dev-dependency-cycle two-version mismatch.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use std::sync::Arc;
use std::time::Duration;

use apple_auth::error::AuthError;
use apple_auth::key::SigningKey;
use apple_auth::secret::ExposeSecret;
use apple_auth::ProviderTokenCache;
use apns_test_utils::fixtures::test_signing_key;
use apns_test_utils::stub_signer::CountingSigner;
use chrono::Utc;

    #[tokio::test]
    async fn test_second_call_within_threshold_reuses_token() {
        let signer = Arc::new(CountingSigner::new());
        let cache = ProviderTokenCache::with_signer(signer.clone());
        let key = test_signing_key();

        let first = cache.get_token(&key).await.unwrap();
        let second = cache.get_token(&key).await.unwrap();

        assert_eq!(
            first.value().expose_secret(),
            second.value().expose_secret(),
            "cached token must be returned bit-identical"
        );
        assert_eq!(signer.calls(), 1, "no re-signing within the threshold");
    }

    #[tokio::test]
    async fn test_stale_token_is_replaced() {
        let signer = Arc::new(CountingSigner::new());
        let cache = ProviderTokenCache::with_signer(signer.clone())
            .with_refresh_threshold(Duration::from_millis(50));
        let key = test_signing_key();

        cache.get_token(&key).await.unwrap();
        tokio::time::sleep(Duration::from_millis(80)).await;
        cache.get_token(&key).await.unwrap();

        assert_eq!(signer.calls(), 2, "crossing the threshold must re-sign");
    }

    #[tokio::test]
    async fn test_concurrent_callers_trigger_single_issuance() {
        let signer = Arc::new(CountingSigner::new());
        let cache = Arc::new(ProviderTokenCache::with_signer(signer.clone()));
        let key = test_signing_key();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let cache = cache.clone();
                let key = key.clone();
                tokio::spawn(async move { cache.get_token(&key).await })
            })
            .collect();

        let tokens: Vec<_> = futures::future::join_all(handles)
            .await
            .into_iter()
            .map(|joined| joined.unwrap().unwrap())
            .collect();

        assert_eq!(signer.calls(), 1, "single-flight: exactly one signing");
        let reference = tokens[0].value().expose_secret().to_string();
        for token in &tokens {
            assert_eq!(token.value().expose_secret(), reference);
        }
    }

    #[tokio::test]
    async fn test_failed_refresh_surfaces_error_then_recovers() {
        let signer = Arc::new(CountingSigner::failing_on([2]));
        let cache = ProviderTokenCache::with_signer(signer.clone())
            .with_refresh_threshold(Duration::from_millis(10));
        let key = test_signing_key();

        cache.get_token(&key).await.unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;
        let failed = cache.get_token(&key).await;
        assert!(
            matches!(failed, Err(AuthError::Signing(_))),
            "a failed refresh must not be papered over with the stale token"
        );

        // The stale entry stayed in place; the next attempt refreshes it.
        let recovered = cache.get_token(&key).await.unwrap();
        assert!(recovered.expires_at() > Utc::now());
        assert_eq!(signer.calls(), 3);
    }

    #[tokio::test]
    async fn test_invalidate_forces_reissue() {
        let signer = Arc::new(CountingSigner::new());
        let cache = ProviderTokenCache::with_signer(signer.clone());
        let key = test_signing_key();

        cache.get_token(&key).await.unwrap();
        cache.invalidate(key.team_id(), key.key_id()).await;
        cache.get_token(&key).await.unwrap();

        assert_eq!(signer.calls(), 2);
    }

    #[tokio::test]
    async fn test_key_pairs_get_separate_slots() {
        let signer = Arc::new(CountingSigner::new());
        let cache = ProviderTokenCache::with_signer(signer.clone());

        let first = test_signing_key();
        let second = SigningKey::new(
            "OTHERKEY01",
            first.team_id(),
            first.private_key_pem().clone(),
        );

        cache.get_token(&first).await.unwrap();
        cache.get_token(&second).await.unwrap();
        cache.get_token(&first).await.unwrap();

        assert_eq!(signer.calls(), 2, "one issuance per key pair");
    }

    #[tokio::test]
    async fn test_invalidate_unknown_key_is_a_no_op() {
        let cache = ProviderTokenCache::new();
        cache.invalidate("TEAM", "KEY").await;
    }
