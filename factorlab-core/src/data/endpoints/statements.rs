//! As-reported financial statements endpoint.
//!
//! Statements carry hundreds of filing-specific columns, so the payload is
//! decoded schema-free. One endpoint instance per reporting period; artifacts
//! land under `financial_statements/{period}`.

use super::super::provider::{DateWindow, Endpoint, FetchError};
use super::{frame_from_json, FMP_BASE_URL};
use polars::prelude::DataFrame;

pub struct StatementsEndpoint {
    api_key: String,
    period: String,
}

impl StatementsEndpoint {
    /// `period` is the upstream reporting period: `annual` or `quarter`.
    pub fn new(api_key: impl Into<String>, period: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            period: period.into(),
        }
    }
}

impl Endpoint for StatementsEndpoint {
    fn name(&self) -> &'static str {
        "financial_statements"
    }

    fn sub_directory(&self) -> String {
        format!("financial_statements/{}", self.period)
    }

    fn build_url(&self, symbol: &str, _window: Option<&DateWindow>) -> String {
        format!(
            "{FMP_BASE_URL}/financial-statement-full-as-reported/{symbol}?period={}&apikey={}",
            self.period, self.api_key
        )
    }

    fn transform(&self, body: &str) -> Result<DataFrame, FetchError> {
        frame_from_json(body)
    }
}
