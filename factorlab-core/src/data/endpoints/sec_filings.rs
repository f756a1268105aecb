//! SEC filings index endpoint.
//!
//! Filing lists (10-K, 10-Q) used downstream to join statements to their
//! actual filing dates. One endpoint instance per form type.

use super::super::provider::{DateWindow, Endpoint, FetchError};
use super::{frame_from_json, FMP_BASE_URL};
use polars::prelude::DataFrame;

pub struct SecFilingsEndpoint {
    api_key: String,
    form: String,
}

impl SecFilingsEndpoint {
    /// `form` is the SEC form type: `10-K` or `10-Q`.
    pub fn new(api_key: impl Into<String>, form: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            form: form.into(),
        }
    }
}

impl Endpoint for SecFilingsEndpoint {
    fn name(&self) -> &'static str {
        "sec_filings"
    }

    fn sub_directory(&self) -> String {
        format!("financial_statements/sec/{}", self.form)
    }

    fn build_url(&self, symbol: &str, _window: Option<&DateWindow>) -> String {
        format!(
            "{FMP_BASE_URL}/sec_filings/{symbol}?type={}&page=0&apikey={}",
            self.form, self.api_key
        )
    }

    fn transform(&self, body: &str) -> Result<DataFrame, FetchError> {
        frame_from_json(body)
    }
}
