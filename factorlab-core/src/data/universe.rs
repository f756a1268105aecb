//! Symbol universe — the set of tickers a refresh run covers.
//!
//! Normally pinned in a TOML file checked in next to the store; can also be
//! pulled live from the S&P 500 constituent list when no file is configured.

use super::endpoints::FMP_BASE_URL;
use super::provider::FetchError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// The symbol universe. Order-irrelevant; treated as immutable for the
/// lifetime of a refresh run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Universe {
    pub symbols: Vec<String>,
}

impl Universe {
    /// Load a universe from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content =
            std::fs::read_to_string(path).map_err(|e| format!("read universe file: {e}"))?;
        Self::from_toml(&content)
    }

    /// Parse a universe from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| format!("parse universe TOML: {e}"))
    }

    /// Serialize the universe to TOML.
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("serialize universe: {e}"))
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.iter().any(|s| s == symbol)
    }
}

#[derive(Debug, Deserialize)]
struct Constituent {
    symbol: String,
}

/// Fetch the current S&P 500 constituent list.
///
/// Pauses a flat ten seconds on rate limiting or transport errors; gives up
/// after a handful of attempts rather than looping forever.
pub async fn fetch_sp500_constituents(api_key: &str) -> Result<Universe, FetchError> {
    const MAX_ATTEMPTS: u32 = 5;
    const PAUSE: Duration = Duration::from_secs(10);

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .expect("failed to build HTTP client");
    let url = format!("{FMP_BASE_URL}/sp500_constituent?apikey={api_key}");

    let mut last_error = FetchError::Transport("no attempts made".into());
    for attempt in 1..=MAX_ATTEMPTS {
        match http.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                let constituents: Vec<Constituent> = response
                    .json()
                    .await
                    .map_err(|e| FetchError::Malformed(e.to_string()))?;
                let symbols: Vec<String> =
                    constituents.into_iter().map(|c| c.symbol).collect();
                tracing::info!(count = symbols.len(), "fetched S&P 500 constituents");
                return Ok(Universe { symbols });
            }
            Ok(response) if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS => {
                tracing::warn!(attempt, "constituent list rate limited, pausing");
                last_error = FetchError::RateLimited {
                    retry_after_secs: PAUSE.as_secs(),
                };
            }
            Ok(response) => {
                let status = response.status().as_u16();
                tracing::warn!(attempt, status, "constituent list request failed");
                last_error = FetchError::Status { status };
            }
            Err(e) => {
                tracing::warn!(attempt, error = %e, "constituent list request failed");
                last_error = FetchError::Transport(e.to_string());
            }
        }
        if attempt < MAX_ATTEMPTS {
            tokio::time::sleep(PAUSE).await;
        }
    }

    Err(last_error)
}
