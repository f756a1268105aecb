//! Company profile endpoint.
//!
//! One small payload per symbol with dozens of mixed-type fields (sector,
//! industry, beta, description, ...). Schema-free decode; downstream profile
//! consumers align schemas when combining.

use super::super::provider::{DateWindow, Endpoint, FetchError};
use super::{frame_from_json, FMP_BASE_URL};
use polars::prelude::DataFrame;

pub struct ProfileEndpoint {
    api_key: String,
}

impl ProfileEndpoint {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }
}

impl Endpoint for ProfileEndpoint {
    fn name(&self) -> &'static str {
        "profiles"
    }

    fn sub_directory(&self) -> String {
        "profiles".to_string()
    }

    fn build_url(&self, symbol: &str, _window: Option<&DateWindow>) -> String {
        format!("{FMP_BASE_URL}/profile/{symbol}?apikey={}", self.api_key)
    }

    fn transform(&self, body: &str) -> Result<DataFrame, FetchError> {
        frame_from_json(body)
    }
}
