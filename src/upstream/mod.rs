//! Thin HTTP wrappers over the third-party sports APIs.
//!
//! One [`UpstreamClient`] per provider, with bounded timeout, a fixed-window
//! rate-limit budget, and exponential-backoff retry on transient failures.

pub mod client;
pub mod ratelimit;

pub use client::{ApiCredential, RetryPolicy, UpstreamClient};
pub use ratelimit::{RateLimitConfig, RateLimiter};

use std::time::Duration;

use thiserror::Error;

/// Failure taxonomy for upstream calls. `is_transient` decides what the
/// retry loop is allowed to re-attempt.
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} returned HTTP {status}")]
    Status {
        provider: String,
        status: reqwest::StatusCode,
    },

    #[error("rate budget for {provider} exhausted, next slot in {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Duration,
    },

    #[error("failed to decode {provider} response: {source}")]
    Decode {
        provider: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl UpstreamError {
    /// Transient failures (timeouts, 5xx, 429, exhausted local budget) are
    /// retried; everything else is permanent and fails the call.
    pub fn is_transient(&self) -> bool {
        match self {
            UpstreamError::Network { .. } => true,
            UpstreamError::RateLimited { .. } => true,
            UpstreamError::Status { status, .. } => {
                status.is_server_error() || *status == reqwest::StatusCode::TOO_MANY_REQUESTS
            }
            UpstreamError::Decode { .. } => false,
            UpstreamError::InvalidUrl(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    fn status_err(status: StatusCode) -> UpstreamError {
        UpstreamError::Status {
            provider: "test".into(),
            status,
        }
    }

    #[test]
    fn test_5xx_and_429_are_transient() {
        assert!(status_err(StatusCode::INTERNAL_SERVER_ERROR).is_transient());
        assert!(status_err(StatusCode::BAD_GATEWAY).is_transient());
        assert!(status_err(StatusCode::TOO_MANY_REQUESTS).is_transient());
    }

    #[test]
    fn test_other_4xx_are_permanent() {
        assert!(!status_err(StatusCode::BAD_REQUEST).is_transient());
        assert!(!status_err(StatusCode::UNAUTHORIZED).is_transient());
        assert!(!status_err(StatusCode::NOT_FOUND).is_transient());
    }

    #[test]
    fn test_rate_budget_is_transient() {
        let err = UpstreamError::RateLimited {
            provider: "test".into(),
            retry_after: Duration::from_secs(30),
        };
        assert!(err.is_transient());
    }
}
