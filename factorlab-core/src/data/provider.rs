//! Endpoint contract and structured error types.
//!
//! The Endpoint trait abstracts over the FMP datasets (prices, market cap,
//! profiles, financial statements) so the fetch engine can drive any of them
//! and tests can substitute stub endpoints pointed at a local server.

use chrono::NaiveDate;
use polars::prelude::DataFrame;
use thiserror::Error;

/// One closed date window, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// One HTTP call's worth of fetch work: a symbol and an optional date window.
#[derive(Debug, Clone)]
pub struct RequestUnit {
    pub symbol: String,
    pub window: Option<DateWindow>,
}

impl RequestUnit {
    pub fn whole_history(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            window: None,
        }
    }

    pub fn windowed(symbol: impl Into<String>, window: DateWindow) -> Self {
        Self {
            symbol: symbol.into(),
            window: Some(window),
        }
    }
}

/// Result of fetching one symbol. The symbol is always present so the
/// orchestrator can log and skip deterministically; an empty frame is the
/// soft-failure sentinel (never a missing value).
#[derive(Debug)]
pub struct FetchOutcome {
    pub symbol: String,
    pub frame: DataFrame,
}

impl FetchOutcome {
    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            frame: DataFrame::default(),
        }
    }

    /// A fetch succeeded only if it produced at least one row.
    pub fn succeeded(&self) -> bool {
        self.frame.height() > 0
    }
}

/// Structured error types for the fetch engine.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("HTTP {status} from provider")]
    Status { status: u16 },

    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("a refresh owned by this engine is already running")]
    AlreadyRunning,
}

/// Date-chunking parameters for endpoints whose upstream caps the range
/// returned per call.
#[derive(Debug, Clone, Copy)]
pub struct ChunkSpec {
    /// First date of history to request.
    pub start_date: NaiveDate,
    /// Maximum width of one request window, in days.
    pub window_days: i64,
}

/// A dataset endpoint: URL construction, payload transform, and storage
/// placement. Implementations are thin configuration; the fetch client and
/// refresh engine do the heavy lifting.
pub trait Endpoint: Send + Sync {
    /// Short dataset name, used for logging.
    fn name(&self) -> &'static str;

    /// Store sub-directory the dataset's artifacts land in.
    fn sub_directory(&self) -> String;

    /// Build the request URL for a symbol, with the date window appended for
    /// chunked endpoints.
    fn build_url(&self, symbol: &str, window: Option<&DateWindow>) -> String;

    /// Turn a raw response body into a columnar frame.
    ///
    /// Must be total over anything the live API plausibly returns: missing or
    /// partially empty structures map to an empty frame, not a panic. A
    /// malformed body is an error and fails the request unit outright.
    fn transform(&self, body: &str) -> Result<DataFrame, FetchError>;

    /// Date-chunking parameters, for endpoints that need them.
    fn chunking(&self) -> Option<ChunkSpec> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_outcome_is_a_soft_failure() {
        let outcome = FetchOutcome::empty("AAPL");
        assert_eq!(outcome.symbol, "AAPL");
        assert!(!outcome.succeeded());
    }

    #[test]
    fn request_unit_carries_window() {
        let window = DateWindow {
            start: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2021, 3, 26).unwrap(),
        };
        let unit = RequestUnit::windowed("MSFT", window);
        assert_eq!(unit.window.unwrap().start, window.start);
        assert!(RequestUnit::whole_history("MSFT").window.is_none());
    }
}
