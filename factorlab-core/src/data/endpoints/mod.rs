//! FMP dataset endpoints.
//!
//! Each endpoint is thin configuration handed to the refresh engine: a URL
//! builder, a payload transform, and a storage sub-directory. Prices and
//! market cap decode typed records (they need float casts and a proper Date
//! column); the wide, schema-free payloads (profiles, statements, filings)
//! go through polars' JSON reader as-is.

mod market_cap;
mod prices;
mod profile;
mod sec_filings;
mod statements;

pub use market_cap::MarketCapEndpoint;
pub use prices::PricesEndpoint;
pub use profile::ProfileEndpoint;
pub use sec_filings::SecFilingsEndpoint;
pub use statements::StatementsEndpoint;

use super::provider::FetchError;
use chrono::NaiveDate;
use polars::prelude::*;
use serde_json::Value;
use std::io::Cursor;

pub const FMP_BASE_URL: &str = "https://financialmodelingprep.com/api/v3";

/// Days since the Unix epoch, the physical representation of a polars Date.
pub(crate) fn days_since_epoch(date: NaiveDate) -> i32 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    (date - epoch).num_days() as i32
}

/// Schema-free JSON-to-frame conversion for wide payloads.
///
/// An array of records becomes one row per record; a bare object becomes a
/// single-row frame; anything else (null, scalar, empty array) is the empty
/// frame. Invalid JSON is a malformed-payload error.
pub(crate) fn frame_from_json(body: &str) -> Result<DataFrame, FetchError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| FetchError::Malformed(e.to_string()))?;
    let records = match value {
        Value::Array(items) => items,
        object @ Value::Object(_) => vec![object],
        _ => Vec::new(),
    };
    if records.is_empty() {
        return Ok(DataFrame::default());
    }

    let buf = serde_json::to_vec(&records).map_err(|e| FetchError::Malformed(e.to_string()))?;
    JsonReader::new(Cursor::new(buf))
        .with_json_format(JsonFormat::Json)
        .finish()
        .map_err(|e| FetchError::Malformed(e.to_string()))
}
