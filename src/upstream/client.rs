use std::time::Duration;

use rand::Rng;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use super::ratelimit::RateLimiter;
use super::UpstreamError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

/// How a provider expects its API key. A pure request parameter; the cache
/// and normalizer never see it.
#[derive(Debug, Clone)]
pub enum ApiCredential {
    /// Key sent as a request header, e.g. `x-apisports-key`.
    Header { name: String, value: String },
    /// Key appended as a query parameter, e.g. `?apikey=...`.
    QueryParam { name: String, value: String },
    /// Keyless upstreams (public scoreboard endpoints).
    #[allow(dead_code)]
    None,
}

/// Exponential backoff schedule for transient failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub min_backoff: Duration,
    pub max_backoff: Duration,
    pub factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_retries: 3,
            min_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(5),
            factor: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (0-based), with up to 25% jitter
    /// so synchronized callers fan out.
    fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.min_backoff.mul_f64(self.factor.powi(attempt as i32));
        let capped = base.min(self.max_backoff);
        let jitter = rand::thread_rng().gen_range(0.0..0.25);
        capped.mul_f64(1.0 + jitter)
    }
}

/// HTTP wrapper for one upstream provider.
#[derive(Clone)]
pub struct UpstreamClient {
    http: Client,
    provider: String,
    base_url: Url,
    credential: ApiCredential,
    retry: RetryPolicy,
    limiter: RateLimiter,
}

impl UpstreamClient {
    pub fn new(
        provider: &str,
        base_url: &str,
        credential: ApiCredential,
        retry: RetryPolicy,
        limiter: RateLimiter,
    ) -> Result<Self, UpstreamError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| UpstreamError::Network {
                url: base_url.to_string(),
                source: e,
            })?;
        Ok(UpstreamClient {
            http,
            provider: provider.to_string(),
            base_url: Url::parse(base_url)?,
            credential,
            retry,
            limiter,
        })
    }

    /// GET `path` with `params` and return the unwrapped JSON payload.
    ///
    /// Retries transient failures (network errors, 5xx, 429, exhausted local
    /// budget) with exponential backoff; other 4xx fail immediately.
    pub async fn get_json(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<Value, UpstreamError> {
        let url = self.build_url(path, params)?;
        let mut attempt = 0u32;
        loop {
            match self.send_once(&url).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < self.retry.max_retries => {
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        provider = %self.provider,
                        attempt,
                        "transient upstream failure, retrying in {:?}: {}",
                        delay,
                        err
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn send_once(&self, url: &Url) -> Result<Value, UpstreamError> {
        if let Err(retry_after) = self.limiter.try_acquire(&self.provider) {
            return Err(UpstreamError::RateLimited {
                provider: self.provider.clone(),
                retry_after,
            });
        }

        debug!(provider = %self.provider, %url, "upstream request");
        let mut request = self.http.get(url.clone());
        if let ApiCredential::Header { name, value } = &self.credential {
            request = request.header(name, value);
        }

        let response = request.send().await.map_err(|e| UpstreamError::Network {
            url: url.to_string(),
            source: e,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                provider: self.provider.clone(),
                status,
            });
        }

        let body: Value = response.json().await.map_err(|e| UpstreamError::Decode {
            provider: self.provider.clone(),
            source: e,
        })?;
        debug!(provider = %self.provider, status = %status, "upstream response");

        Ok(unwrap_envelope(body))
    }

    fn build_url(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, UpstreamError> {
        let mut url = self.base_url.join(path)?;
        {
            let mut query = url.query_pairs_mut();
            for (k, v) in params {
                query.append_pair(k, v);
            }
            if let ApiCredential::QueryParam { name, value } = &self.credential {
                query.append_pair(name, value);
            }
        }
        Ok(url)
    }
}

/// Strip the provider's response envelope.
///
/// Handles `{"status": "success", "data": [...]}` (cricket provider),
/// `{"response": [...]}` (api-sports family), and raw arrays as-is.
pub fn unwrap_envelope(raw: Value) -> Value {
    if let Value::Object(obj) = &raw {
        if obj.get("status").and_then(Value::as_str) == Some("success") {
            if let Some(data) = obj.get("data") {
                return data.clone();
            }
        }
        if let Some(response) = obj.get("response") {
            return response.clone();
        }
    }
    raw
}
