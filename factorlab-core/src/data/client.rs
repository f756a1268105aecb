//! Rate-limited fetch client.
//!
//! One logical fetch per request unit, bounded by an admission gate shared
//! across every in-flight request of a job. The gate is a counting semaphore
//! sized to the provider's rate limit; a permit is held for the duration of a
//! single attempt only, so a symbol sleeping through a 429 backoff does not
//! starve the others.

use super::provider::{Endpoint, FetchOutcome, RequestUnit};
use polars::prelude::DataFrame;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Fallback backoff when a 429 arrives without a usable Retry-After header.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Outcome of a single attempt, decided while the admission permit is held.
enum Attempt {
    Done(DataFrame),
    /// 429 — sleep this many seconds (outside the permit), consume one try.
    Backoff(u64),
    /// Transient failure — consume one try and go again.
    Retry,
    /// Unrecoverable for this unit; retrying cannot help.
    Fatal,
}

/// HTTP client with a shared admission gate and bounded retries.
///
/// Safe for concurrent use from many logical tasks; clones share the gate.
#[derive(Clone)]
pub struct RateLimitedClient {
    http: reqwest::Client,
    gate: Arc<Semaphore>,
    max_retries: u32,
}

impl RateLimitedClient {
    pub fn new(rate_limit: usize, max_retries: u32) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");
        Self {
            http,
            gate: Arc::new(Semaphore::new(rate_limit)),
            max_retries,
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Fetch one request unit, retrying transient failures up to the bound.
    ///
    /// Always returns an outcome carrying the unit's symbol; exhaustion of
    /// the retry budget yields the empty-frame soft failure. A transform
    /// error is terminal immediately — an unparseable payload does not get
    /// better by re-requesting it.
    pub async fn fetch(&self, unit: RequestUnit, endpoint: &dyn Endpoint) -> FetchOutcome {
        let url = endpoint.build_url(&unit.symbol, unit.window.as_ref());
        let mut attempt = 0u32;

        while attempt < self.max_retries {
            attempt += 1;
            match self.attempt(&unit.symbol, &url, endpoint, attempt).await {
                Attempt::Done(frame) => {
                    return FetchOutcome {
                        symbol: unit.symbol,
                        frame,
                    }
                }
                Attempt::Backoff(secs) => {
                    // Permit already released; other symbols proceed while
                    // this one sleeps.
                    tokio::time::sleep(Duration::from_secs(secs)).await;
                }
                Attempt::Retry => {}
                Attempt::Fatal => break,
            }
        }

        tracing::error!(
            symbol = %unit.symbol,
            endpoint = endpoint.name(),
            attempts = attempt,
            "giving up on symbol"
        );
        FetchOutcome::empty(unit.symbol)
    }

    /// One admission-gated attempt: GET, classify the status, transform.
    async fn attempt(
        &self,
        symbol: &str,
        url: &str,
        endpoint: &dyn Endpoint,
        attempt: u32,
    ) -> Attempt {
        let _permit = self
            .gate
            .acquire()
            .await
            .expect("admission gate is never closed");

        tracing::info!(symbol, endpoint = endpoint.name(), attempt, "fetching");

        let response = match self.http.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(symbol, attempt, error = %e, "transport error");
                return Attempt::Retry;
            }
        };

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            tracing::warn!(
                symbol,
                attempt,
                retry_after_secs = retry_after,
                "rate limited, backing off"
            );
            return Attempt::Backoff(retry_after);
        }

        if !status.is_success() {
            tracing::warn!(symbol, attempt, status = status.as_u16(), "attempt failed");
            return Attempt::Retry;
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(symbol, attempt, error = %e, "body read failed");
                return Attempt::Retry;
            }
        };

        match endpoint.transform(&body) {
            Ok(frame) => {
                tracing::info!(symbol, attempt, rows = frame.height(), "fetched");
                Attempt::Done(frame)
            }
            Err(e) => {
                tracing::error!(symbol, attempt, error = %e, "payload transform failed");
                Attempt::Fatal
            }
        }
    }
}
