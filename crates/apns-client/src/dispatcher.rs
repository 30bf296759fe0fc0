//! The push dispatcher.
//!
//! Sends one notification to one device over Apple's Provider API. Every
//! attempt carries a provider token obtained from the shared
//! [`ProviderTokenCache`], so a request is never sent with an expired
//! credential. Responses are classified via [`ErrorReason`]; transient
//! rejections and connection-level failures are retried under the
//! configured [`RetryPolicy`](crate::retry::RetryPolicy) and its overall
//! deadline, and an `ExpiredProviderToken` rejection forces the cache to
//! reissue before one more try.

use crate::config::DispatcherConfig;
use crate::error::PushError;
use crate::notification::PushRequest;
use crate::response::{parse_error_body, ErrorReason, PushResult};
use apple_auth::secret::ExposeSecret;
use apple_auth::{ProviderTokenCache, SignedToken, SigningKey};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Sends push notifications for one signing key against one APNs
/// environment. Cheap to share behind an [`Arc`]; sends are independent and
/// may run concurrently.
pub struct PushDispatcher {
    http: reqwest::Client,
    config: DispatcherConfig,
    key: SigningKey,
    tokens: Arc<ProviderTokenCache>,
}

impl PushDispatcher {
    /// Create a dispatcher.
    ///
    /// # Errors
    ///
    /// Returns [`PushError::Configuration`] if the HTTP client cannot be
    /// built.
    pub fn new(
        config: DispatcherConfig,
        key: SigningKey,
        tokens: Arc<ProviderTokenCache>,
    ) -> Result<Self, PushError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| PushError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            config,
            key,
            tokens,
        })
    }

    /// Send one notification to one device.
    ///
    /// Returns `Ok` with the classified outcome whenever APNs answered,
    /// accepted or not; the caller inspects
    /// [`PushResult::accepted`](crate::response::PushResult) and
    /// `error_reason`.
    ///
    /// # Errors
    ///
    /// - [`PushError::Auth`] if a provider token could not be obtained.
    /// - [`PushError::Network`] if connection-level failures exhausted the
    ///   retry budget or the overall deadline.
    #[instrument(skip_all, fields(topic = %request.topic))]
    pub async fn send(&self, request: &PushRequest) -> Result<PushResult, PushError> {
        let url = format!(
            "{}/3/device/{}",
            self.config.origin(),
            request.device_token
        );
        let deadline = Instant::now() + self.config.retry.overall_deadline;
        let device_prefix: String = request.device_token.chars().take(8).collect();

        let mut retries_used: u32 = 0;
        let mut token_reissued = false;

        loop {
            let token = self.tokens.get_token(&self.key).await?;

            match self.attempt(&url, request, &token).await {
                Ok(result) if result.accepted => {
                    info!(
                        target: "apns_client.dispatcher",
                        device = %device_prefix,
                        apns_id = result.apns_id.as_deref().unwrap_or(""),
                        "Push accepted"
                    );
                    return Ok(result);
                }
                Ok(result) => {
                    warn!(
                        target: "apns_client.dispatcher",
                        device = %device_prefix,
                        status = result.http_status,
                        reason = result.error_reason.as_ref().map_or("", |r| r.as_str()),
                        "Push rejected"
                    );

                    match result.error_reason.clone() {
                        Some(ErrorReason::ExpiredProviderToken) if !token_reissued => {
                            // The cached token aged out server-side; discard
                            // it and retry once with a fresh signature.
                            self.tokens
                                .invalidate(self.key.team_id(), self.key.key_id())
                                .await;
                            token_reissued = true;
                            if retries_used >= self.config.retry.max_retries {
                                return Ok(result);
                            }
                            retries_used += 1;
                        }
                        Some(reason) if reason.is_transient() => {
                            if retries_used >= self.config.retry.max_retries {
                                warn!(
                                    target: "apns_client.dispatcher",
                                    device = %device_prefix,
                                    "Retry budget exhausted"
                                );
                                return Ok(result);
                            }
                            if !self.backoff(retries_used, deadline).await {
                                return Ok(result);
                            }
                            retries_used += 1;
                        }
                        _ => return Ok(result),
                    }
                }
                Err(e) => {
                    warn!(
                        target: "apns_client.dispatcher",
                        device = %device_prefix,
                        error = %e,
                        "Connection-level failure"
                    );

                    if retries_used >= self.config.retry.max_retries {
                        return Err(PushError::Network(format!(
                            "send failed after {} attempts: {e}",
                            retries_used + 1
                        )));
                    }
                    if !self.backoff(retries_used, deadline).await {
                        return Err(PushError::Network(format!(
                            "deadline exceeded after {} attempts: {e}",
                            retries_used + 1
                        )));
                    }
                    retries_used += 1;
                }
            }
        }
    }

    /// One HTTP exchange. `Err` is a connection-level failure; any HTTP
    /// response, accepted or rejected, is `Ok`.
    async fn attempt(
        &self,
        url: &str,
        request: &PushRequest,
        token: &SignedToken,
    ) -> Result<PushResult, reqwest::Error> {
        let mut http_request = self
            .http
            .post(url)
            .header(
                "authorization",
                format!("bearer {}", token.value().expose_secret()),
            )
            .header("apns-topic", request.topic.as_str())
            .header("apns-push-type", request.push_type.header_value())
            .header("apns-priority", request.priority.header_value());

        if let Some(expiration) = request.expiration {
            http_request = http_request.header("apns-expiration", expiration.to_string());
        }

        let response = http_request.json(&request.payload).send().await?;
        let status = response.status();

        if status.is_success() {
            let apns_id = response
                .headers()
                .get("apns-id")
                .and_then(|value| value.to_str().ok())
                .map(ToString::to_string);
            Ok(PushResult::accepted(status.as_u16(), apns_id))
        } else {
            let body = response.text().await.unwrap_or_default();
            Ok(PushResult::rejected(
                status.as_u16(),
                parse_error_body(&body),
            ))
        }
    }

    /// Sleep for the backoff before retry `retry`, unless doing so would
    /// cross the deadline. Returns whether the retry may proceed.
    async fn backoff(&self, retry: u32, deadline: Instant) -> bool {
        let delay = self.config.retry.backoff_before_retry(retry);
        if Instant::now() + delay >= deadline {
            warn!(
                target: "apns_client.dispatcher",
                backoff_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "Backoff would exceed the overall deadline, giving up"
            );
            return false;
        }

        debug!(
            target: "apns_client.dispatcher",
            retry,
            backoff_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "Retrying after backoff"
        );
        tokio::time::sleep(delay).await;
        true
    }
}
