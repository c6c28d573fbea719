//! Blocking JSON client shared by the HTTP providers.
//!
//! Every request goes through the same retry loop: exponential backoff from
//! `base_delay`, a bounded per-request timeout, and the circuit breaker of the
//! host the client talks to. A request that exhausts its retries counts as a
//! single breaker failure, however many attempts it made.

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::circuit_breaker::CircuitBreaker;
use super::provider::DataError;

#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub timeout: Duration,
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

pub struct HttpClient {
    client: reqwest::blocking::Client,
    breaker: Arc<CircuitBreaker>,
    max_retries: u32,
    base_delay: Duration,
}

impl HttpClient {
    pub fn new(settings: &HttpSettings, breaker: Arc<CircuitBreaker>) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(settings.timeout)
            .user_agent(concat!("ratio/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            breaker,
            max_retries: settings.max_retries,
            base_delay: settings.base_delay,
        })
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// GET `url` and decode the body as `T`, retrying transient failures.
    ///
    /// `symbol` is only used for error messages and logs; URLs may carry API
    /// keys and are never logged.
    pub fn get_json<T: DeserializeOwned>(&self, url: &str, symbol: &str) -> Result<T, DataError> {
        if !self.breaker.is_allowed() {
            return Err(DataError::CircuitBreakerTripped);
        }

        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                debug!(symbol, attempt, delay_ms = delay.as_millis() as u64, "retrying request");
                std::thread::sleep(delay);
            }

            // Another fetch on this host may have opened the breaker while we slept.
            if !self.breaker.is_allowed() {
                return Err(last_error.unwrap_or(DataError::CircuitBreakerTripped));
            }

            let resp = match self.client.get(url).send() {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() => {
                    last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                    continue;
                }
                Err(e) => return Err(DataError::NetworkUnreachable(e.to_string())),
            };

            let status = resp.status();
            match status {
                StatusCode::FORBIDDEN => {
                    warn!(symbol, "provider returned 403, tripping circuit breaker");
                    self.breaker.trip();
                    return Err(DataError::CircuitBreakerTripped);
                }
                StatusCode::UNAUTHORIZED => {
                    return Err(DataError::AuthenticationRequired(format!(
                        "provider rejected credentials while fetching {symbol}"
                    )));
                }
                StatusCode::NOT_FOUND => {
                    return Err(DataError::SymbolNotFound {
                        symbol: symbol.to_string(),
                    });
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    let retry_after_secs = resp
                        .headers()
                        .get("retry-after")
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.parse::<u64>().ok())
                        .unwrap_or(60);
                    last_error = Some(DataError::RateLimited { retry_after_secs });
                    continue;
                }
                s if !s.is_success() => {
                    last_error = Some(DataError::Provider(format!("HTTP {s} for {symbol}")));
                    continue;
                }
                _ => {}
            }

            let body: T = resp.json().map_err(|e| {
                DataError::ResponseFormatChanged(format!("failed to parse response for {symbol}: {e}"))
            })?;
            self.breaker.record_success();
            return Ok(body);
        }

        self.breaker.record_failure();
        let err = last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into()));
        warn!(symbol, error = %err, "request failed after retries");
        Err(err)
    }
}
