//! HTTP client with rate limiting awareness.
//!
//! Thin wrapper around reqwest shared by every network collaborator:
//! - Rate limit tracking from response headers
//! - Automatic throttling when approaching limits
//! - Status codes mapped onto [`TrustScoreError`] variants
//! - JSON and text helpers

use crate::config::NetworkConfig;
use crate::error::{Result, TrustScoreError};
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Rate limit state extracted from response headers.
#[derive(Debug, Clone, Default)]
pub struct RateLimitState {
    /// Remaining requests allowed.
    pub remaining: Option<u64>,
    /// Total request limit.
    pub limit: Option<u64>,
}

impl RateLimitState {
    /// Throttle when fewer than 10% of the window's requests remain.
    pub fn should_throttle(&self) -> bool {
        match (self.remaining, self.limit) {
            (Some(remaining), Some(limit)) if limit > 0 => {
                let threshold = (limit as f64 * 0.1) as u64;
                remaining < threshold.max(1)
            }
            _ => false,
        }
    }
}

/// HTTP client with rate limiting awareness.
pub struct HttpClient {
    client: Client,
    rate_limit_remaining: AtomicI64,
    rate_limit_limit: AtomicU64,
    timeout: Duration,
    throttle_delay: Duration,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("timeout", &self.timeout)
            .field("rate_limit", &self.rate_limit_state())
            .finish()
    }
}

impl HttpClient {
    /// Create a new HTTP client with the default request timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(NetworkConfig::REQUEST_TIMEOUT)
    }

    /// Create a new HTTP client with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(NetworkConfig::USER_AGENT)
            .build()
            .map_err(|e| TrustScoreError::Network {
                message: format!("Failed to create HTTP client: {}", e),
                cause: None,
            })?;

        Ok(Self {
            client,
            rate_limit_remaining: AtomicI64::new(-1),
            rate_limit_limit: AtomicU64::new(0),
            timeout,
            throttle_delay: Duration::from_millis(500),
        })
    }

    /// The configured per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Get the current rate limit state.
    pub fn rate_limit_state(&self) -> RateLimitState {
        let remaining = self.rate_limit_remaining.load(Ordering::SeqCst);
        let limit = self.rate_limit_limit.load(Ordering::SeqCst);
        RateLimitState {
            remaining: u64::try_from(remaining).ok(),
            limit: (limit > 0).then_some(limit),
        }
    }

    /// GET a URL; non-success statuses become errors.
    pub async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<Response> {
        let request = with_headers(self.client.get(url), headers);
        self.send(request, "GET", url).await
    }

    /// GET a URL and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<T> {
        let response = self.get(url, headers).await?;
        decode_json(response, url).await
    }

    /// GET a URL and return the body as text.
    pub async fn get_text(&self, url: &str, headers: &[(&str, &str)]) -> Result<String> {
        let response = self.get(url, headers).await?;
        response.text().await.map_err(|e| TrustScoreError::Network {
            message: format!("Failed to read body of {}: {}", url, e),
            cause: None,
        })
    }

    /// POST a JSON body and decode the JSON response.
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &B,
    ) -> Result<T> {
        let request = with_headers(self.client.post(url).json(body), headers);
        let response = self.send(request, "POST", url).await?;
        decode_json(response, url).await
    }

    /// Check if an HTTP status code indicates a retryable error.
    pub fn is_retryable_status(status: StatusCode) -> bool {
        matches!(status.as_u16(), 408 | 429 | 500 | 502 | 503 | 504)
    }

    async fn send(&self, request: RequestBuilder, method: &str, url: &str) -> Result<Response> {
        self.maybe_throttle().await;

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                TrustScoreError::Timeout(self.timeout)
            } else {
                TrustScoreError::Network {
                    message: format!("{} {} failed: {}", method, url, e),
                    cause: Some(e.to_string()),
                }
            }
        })?;

        self.update_rate_limits(&response);
        check_response_status(response, url)
    }

    async fn maybe_throttle(&self) {
        let state = self.rate_limit_state();
        if state.should_throttle() {
            warn!(
                "Rate limit approaching (remaining: {:?}/{:?}), throttling for {:?}",
                state.remaining, state.limit, self.throttle_delay
            );
            tokio::time::sleep(self.throttle_delay).await;
        }
    }

    fn update_rate_limits(&self, response: &Response) {
        let headers = response.headers();

        if let Some(remaining) = header_number::<i64>(headers, "X-RateLimit-Remaining") {
            self.rate_limit_remaining.store(remaining, Ordering::SeqCst);
        }
        if let Some(limit) = header_number::<u64>(headers, "X-RateLimit-Limit") {
            self.rate_limit_limit.store(limit, Ordering::SeqCst);
        }

        let state = self.rate_limit_state();
        if let (Some(remaining), Some(limit)) = (state.remaining, state.limit) {
            debug!("Rate limit: {}/{}", remaining, limit);
        }
    }
}

/// Whether a paginated response advertises a further page.
pub fn has_next_page(response: &Response) -> bool {
    response
        .headers()
        .get(header::LINK)
        .and_then(|v| v.to_str().ok())
        .map(|link| link.contains("rel=\"next\""))
        .unwrap_or(false)
}

/// Extract domain from a URL.
fn extract_domain(url: &str) -> String {
    url::Url::parse(url)
        .map(|u| u.host_str().unwrap_or("unknown").to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}

fn with_headers(mut request: RequestBuilder, headers: &[(&str, &str)]) -> RequestBuilder {
    for (key, value) in headers {
        request = request.header(*key, *value);
    }
    request
}

fn header_number<T: std::str::FromStr>(headers: &header::HeaderMap, name: &str) -> Option<T> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<T>().ok())
}

async fn decode_json<T: DeserializeOwned>(response: Response, url: &str) -> Result<T> {
    response.json::<T>().await.map_err(|e| TrustScoreError::Json {
        message: format!("Failed to parse response from {}: {}", url, e),
        source: None,
    })
}

fn check_response_status(response: Response, url: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let rate_limit_exhausted = header_number::<u64>(response.headers(), "X-RateLimit-Remaining") == Some(0);
    if status == StatusCode::TOO_MANY_REQUESTS || (status == StatusCode::FORBIDDEN && rate_limit_exhausted) {
        let retry_after = header_number::<u64>(response.headers(), header::RETRY_AFTER.as_str());
        return Err(TrustScoreError::RateLimited {
            service: extract_domain(url),
            retry_after_secs: retry_after,
        });
    }

    Err(status_error(status, url))
}

/// Map a non-success, non-rate-limit status onto an error.
pub(crate) fn status_error(status: StatusCode, url: &str) -> TrustScoreError {
    if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
        return TrustScoreError::NotFound {
            resource: url.to_string(),
        };
    }

    if HttpClient::is_retryable_status(status) {
        return TrustScoreError::Network {
            message: format!("{} returned {}", url, status),
            cause: None,
        };
    }

    TrustScoreError::Api {
        service: extract_domain(url),
        message: format!("{} returned {}", url, status),
        status_code: Some(status.as_u16()),
    }
}
