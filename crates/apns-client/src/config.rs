//! Endpoint selection and dispatcher configuration.

use crate::error::PushError;
use crate::retry::RetryPolicy;
use std::str::FromStr;
use std::time::Duration;

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default connection timeout for the HTTP client.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Which APNs environment to send against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApnsEndpoint {
    /// `api.push.apple.com` — devices running App Store / TestFlight builds.
    Production,
    /// `api.sandbox.push.apple.com` — devices running development builds.
    Sandbox,
}

impl ApnsEndpoint {
    /// Hostname of the Provider API for this environment.
    #[must_use]
    pub fn host(self) -> &'static str {
        match self {
            Self::Production => "api.push.apple.com",
            Self::Sandbox => "api.sandbox.push.apple.com",
        }
    }
}

impl FromStr for ApnsEndpoint {
    type Err = PushError;

    /// Parse an environment name, case-insensitively: `"production"` or
    /// `"sandbox"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "production" => Ok(Self::Production),
            "sandbox" => Ok(Self::Sandbox),
            other => Err(PushError::Configuration(format!(
                "unknown APNs environment '{other}' (expected 'production' or 'sandbox')"
            ))),
        }
    }
}

impl std::fmt::Display for ApnsEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Production => write!(f, "production"),
            Self::Sandbox => write!(f, "sandbox"),
        }
    }
}

/// Configuration for a [`PushDispatcher`](crate::dispatcher::PushDispatcher).
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Target APNs environment.
    pub endpoint: ApnsEndpoint,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Retry/backoff policy applied to every send.
    pub retry: RetryPolicy,
    /// Origin override (scheme + authority), e.g. a local stub server or a
    /// forwarding proxy. When unset, the origin is derived from `endpoint`.
    pub base_url: Option<String>,
}

impl DispatcherConfig {
    /// Create a configuration with default timeouts and retry policy.
    #[must_use]
    pub fn new(endpoint: ApnsEndpoint) -> Self {
        Self {
            endpoint,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            retry: RetryPolicy::default(),
            base_url: None,
        }
    }

    /// Set the per-request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Override the origin the dispatcher sends to.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// The origin requests are sent to.
    #[must_use]
    pub fn origin(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| format!("https://{}", self.endpoint.host()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_hosts() {
        assert_eq!(ApnsEndpoint::Production.host(), "api.push.apple.com");
        assert_eq!(ApnsEndpoint::Sandbox.host(), "api.sandbox.push.apple.com");
    }

    #[test]
    fn test_endpoint_from_str_is_case_insensitive() {
        assert_eq!(
            "production".parse::<ApnsEndpoint>().unwrap(),
            ApnsEndpoint::Production
        );
        assert_eq!(
            "SANDBOX".parse::<ApnsEndpoint>().unwrap(),
            ApnsEndpoint::Sandbox
        );
        assert!("staging".parse::<ApnsEndpoint>().is_err());
    }

    #[test]
    fn test_config_defaults() {
        let config = DispatcherConfig::new(ApnsEndpoint::Sandbox);
        assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
        assert_eq!(config.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
        assert_eq!(config.origin(), "https://api.sandbox.push.apple.com");
    }

    #[test]
    fn test_base_url_override() {
        let config =
            DispatcherConfig::new(ApnsEndpoint::Sandbox).with_base_url("http://127.0.0.1:8999");
        assert_eq!(config.origin(), "http://127.0.0.1:8999");
    }
}
