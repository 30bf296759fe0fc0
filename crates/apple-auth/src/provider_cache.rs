//! Cached APNs provider authentication tokens.
//!
//! Apple requires push-sending processes to reuse a provider token rather
//! than signing a fresh one per request, and rejects tokens older than one
//! hour. [`ProviderTokenCache`] keeps one token per `(team_id, key_id)` pair
//! and replaces it once it crosses the refresh threshold.
//!
//! Reads of a still-valid token take a shared lock and proceed concurrently.
//! A refresh takes the slot's exclusive lock and re-checks freshness after
//! acquiring it, so however many callers observe the same stale token, only
//! one signs the replacement; the rest either wait for that result or return
//! the still-valid entry.

use crate::error::AuthError;
use crate::key::SigningKey;
use crate::signer::{Claims, Es256Signer, SignedToken, TokenPurpose, TokenSigner};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, instrument, trace, warn};

/// Refresh a provider token once it is this old (50 minutes, strictly under
/// Apple's 60-minute hard limit).
pub const DEFAULT_REFRESH_THRESHOLD: Duration = Duration::from_secs(50 * 60);

/// The cache's single live entry for one key pair. Replaced on refresh,
/// never mutated in place.
#[derive(Debug, Clone)]
struct CachedProviderToken {
    token: SignedToken,
    last_issued_at: DateTime<Utc>,
}

type TokenSlot = Arc<RwLock<Option<CachedProviderToken>>>;

/// Cache of provider tokens, one slot per `(team_id, key_id)` pair.
///
/// Cheap to share behind an [`Arc`]; all methods take `&self`.
pub struct ProviderTokenCache {
    signer: Arc<dyn TokenSigner>,
    refresh_threshold: chrono::Duration,
    slots: Mutex<HashMap<(String, String), TokenSlot>>,
}

impl ProviderTokenCache {
    /// Create a cache backed by the production ES256 signer.
    #[must_use]
    pub fn new() -> Self {
        Self::with_signer(Arc::new(Es256Signer::new()))
    }

    /// Create a cache backed by a caller-supplied signer.
    #[must_use]
    pub fn with_signer(signer: Arc<dyn TokenSigner>) -> Self {
        Self {
            signer,
            refresh_threshold: chrono_duration(DEFAULT_REFRESH_THRESHOLD),
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Override the refresh threshold. Must stay under Apple's one-hour
    /// validity limit; mainly useful for driving staleness in tests.
    #[must_use]
    pub fn with_refresh_threshold(mut self, threshold: Duration) -> Self {
        self.refresh_threshold = chrono_duration(threshold);
        self
    }

    /// Return a provider token for `key`, younger than the refresh
    /// threshold — the cached one when still valid, a freshly signed
    /// replacement otherwise.
    ///
    /// # Errors
    ///
    /// Propagates signer errors. A failed refresh leaves the previous stale
    /// entry in place (a later call may retry); it is returned as an error,
    /// never silently handed out as if valid.
    #[instrument(skip_all, fields(team_id = %key.team_id(), kid = %key.key_id()))]
    pub async fn get_token(&self, key: &SigningKey) -> Result<SignedToken, AuthError> {
        let slot = self.slot(key.team_id(), key.key_id()).await;

        {
            let guard = slot.read().await;
            if let Some(cached) = guard.as_ref() {
                if self.is_fresh(cached) {
                    trace!(
                        target: "apple_auth.provider_cache",
                        "Returning cached provider token"
                    );
                    return Ok(cached.token.clone());
                }
            }
        }

        // Exclusive lock serializes refreshes for this key pair. Re-check
        // after acquisition: another caller may have refreshed while we
        // waited for the lock.
        let mut guard = slot.write().await;
        if let Some(cached) = guard.as_ref() {
            if self.is_fresh(cached) {
                trace!(
                    target: "apple_auth.provider_cache",
                    "Provider token was refreshed while waiting"
                );
                return Ok(cached.token.clone());
            }
        }

        let was_empty = guard.is_none();
        let issued_at = Utc::now();
        let claims = Claims::provider(key.team_id(), issued_at);
        let token = match self.signer.sign(key, &claims, TokenPurpose::ProviderAuth) {
            Ok(token) => token,
            Err(e) => {
                warn!(
                    target: "apple_auth.provider_cache",
                    error = %e,
                    "Provider token refresh failed; keeping previous entry"
                );
                return Err(e);
            }
        };

        debug!(
            target: "apple_auth.provider_cache",
            expires_at = %token.expires_at(),
            "Provider token {}",
            if was_empty { "issued" } else { "refreshed" }
        );

        *guard = Some(CachedProviderToken {
            token: token.clone(),
            last_issued_at: issued_at,
        });

        Ok(token)
    }

    /// Discard the cached token for a key pair, forcing the next
    /// [`get_token`](Self::get_token) call to sign a replacement. Used when
    /// APNs rejects the current token as expired.
    pub async fn invalidate(&self, team_id: &str, key_id: &str) {
        let slot = {
            let slots = self.slots.lock().await;
            slots.get(&(team_id.to_string(), key_id.to_string())).cloned()
        };

        if let Some(slot) = slot {
            let mut guard = slot.write().await;
            if guard.take().is_some() {
                debug!(
                    target: "apple_auth.provider_cache",
                    team_id,
                    kid = key_id,
                    "Provider token invalidated"
                );
            }
        }
    }

    async fn slot(&self, team_id: &str, key_id: &str) -> TokenSlot {
        let mut slots = self.slots.lock().await;
        slots
            .entry((team_id.to_string(), key_id.to_string()))
            .or_default()
            .clone()
    }

    fn is_fresh(&self, cached: &CachedProviderToken) -> bool {
        Utc::now().signed_duration_since(cached.last_issued_at) < self.refresh_threshold
    }
}

impl Default for ProviderTokenCache {
    fn default() -> Self {
        Self::new()
    }
}

fn chrono_duration(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::MAX)
}

