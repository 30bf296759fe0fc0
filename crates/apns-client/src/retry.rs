//! Retry policy for push dispatch.
//!
//! One parametrized policy object, owned by the dispatcher configuration
//! and applied to every send, instead of ad-hoc retry loops per call site.

use std::time::Duration;

/// Default number of retries after the initial attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default first backoff delay.
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(500);

/// Default backoff ceiling.
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(10);

/// Default overall deadline for one send, including backoff sleeps.
pub const DEFAULT_OVERALL_DEADLINE: Duration = Duration::from_secs(60);

/// Exponential-backoff retry policy.
///
/// `max_retries` counts attempts beyond the first, so `max_retries: 3`
/// allows four requests in total. Backoff doubles per retry up to
/// `max_backoff` and is deterministic. `overall_deadline` bounds the whole
/// send; the dispatcher never sleeps past it.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retries after the initial attempt.
    pub max_retries: u32,
    /// Backoff before the first retry.
    pub initial_backoff: Duration,
    /// Ceiling on the backoff delay.
    pub max_backoff: Duration,
    /// Multiplier applied per retry.
    pub backoff_multiplier: f64,
    /// Deadline for the whole send, attempts and sleeps included.
    pub overall_deadline: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
            backoff_multiplier: 2.0,
            overall_deadline: DEFAULT_OVERALL_DEADLINE,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub fn no_retries() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Backoff delay before retry number `retry` (0-based).
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn backoff_before_retry(&self, retry: u32) -> Duration {
        let factor = self.backoff_multiplier.powi(i32::try_from(retry).unwrap_or(i32::MAX));
        let millis = (self.initial_backoff.as_millis() as f64) * factor;
        let capped = millis.min(self.max_backoff.as_millis() as f64);
        Duration::from_millis(capped.max(0.0) as u64)
    }
}
