//! Market capitalization history endpoint.
//!
//! The upstream caps the date range returned per call, so this endpoint is
//! chunked: the engine requests bounded windows and concatenates them in
//! chronological window order.

use super::super::provider::{ChunkSpec, DateWindow, Endpoint, FetchError};
use super::{days_since_epoch, FMP_BASE_URL};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct MarketCapRecord {
    date: String,
    #[serde(rename = "marketCap")]
    market_cap: f64,
}

pub struct MarketCapEndpoint {
    api_key: String,
    start_date: NaiveDate,
    window_days: i64,
}

impl MarketCapEndpoint {
    pub fn new(api_key: impl Into<String>, start_date: NaiveDate, window_days: i64) -> Self {
        Self {
            api_key: api_key.into(),
            start_date,
            window_days,
        }
    }
}

impl Endpoint for MarketCapEndpoint {
    fn name(&self) -> &'static str {
        "marketcap"
    }

    fn sub_directory(&self) -> String {
        "marketcap".to_string()
    }

    fn build_url(&self, symbol: &str, window: Option<&DateWindow>) -> String {
        let (from, to) = match window {
            Some(w) => (w.start, w.end),
            None => (self.start_date, chrono::Local::now().date_naive()),
        };
        format!(
            "{FMP_BASE_URL}/historical-market-capitalization/{symbol}?from={from}&to={to}&apikey={}",
            self.api_key
        )
    }

    fn transform(&self, body: &str) -> Result<DataFrame, FetchError> {
        let value: Value =
            serde_json::from_str(body).map_err(|e| FetchError::Malformed(e.to_string()))?;
        let Value::Array(items) = value else {
            // error objects and the like carry no history
            return Ok(DataFrame::default());
        };
        if items.is_empty() {
            return Ok(DataFrame::default());
        }
        let records: Vec<MarketCapRecord> = serde_json::from_value(Value::Array(items))
            .map_err(|e| FetchError::Malformed(e.to_string()))?;

        let mut dates = Vec::with_capacity(records.len());
        for record in &records {
            let date = NaiveDate::parse_from_str(&record.date, "%Y-%m-%d")
                .map_err(|e| FetchError::Malformed(format!("date '{}': {e}", record.date)))?;
            dates.push(days_since_epoch(date));
        }
        let caps: Vec<f64> = records.iter().map(|r| r.market_cap).collect();

        DataFrame::new(vec![
            Column::new("date".into(), dates)
                .cast(&DataType::Date)
                .map_err(|e| FetchError::Malformed(format!("date cast: {e}")))?,
            Column::new("marketCap".into(), caps),
        ])
        .map_err(|e| FetchError::Malformed(format!("frame creation: {e}")))
    }

    fn chunking(&self) -> Option<ChunkSpec> {
        Some(ChunkSpec {
            start_date: self.start_date,
            window_days: self.window_days,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::chunker::DEFAULT_WINDOW_DAYS;

    fn endpoint() -> MarketCapEndpoint {
        MarketCapEndpoint::new(
            "k",
            NaiveDate::from_ymd_opt(2015, 1, 1).unwrap(),
            DEFAULT_WINDOW_DAYS,
        )
    }

    #[test]
    fn transforms_record_array() {
        let body = r#"[
            {"symbol": "AAPL", "date": "2024-01-03", "marketCap": 2870000000000.0},
            {"symbol": "AAPL", "date": "2024-01-02", "marketCap": 2890000000000.0}
        ]"#;
        let frame = endpoint().transform(body).unwrap();
        assert_eq!(frame.height(), 2);
        assert_eq!(
            frame.column("marketCap").unwrap().f64().unwrap().get(1),
            Some(2_890_000_000_000.0)
        );
    }

    #[test]
    fn non_array_payload_is_empty() {
        assert_eq!(
            endpoint()
                .transform(r#"{"Error Message": "Limit Reach"}"#)
                .unwrap()
                .height(),
            0
        );
        assert_eq!(endpoint().transform("[]").unwrap().height(), 0);
    }

    #[test]
    fn url_carries_window_bounds() {
        let window = DateWindow {
            start: NaiveDate::from_ymd_opt(2015, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2016, 3, 26).unwrap(),
        };
        let url = endpoint().build_url("MSFT", Some(&window));
        assert!(url.contains("historical-market-capitalization/MSFT"));
        assert!(url.contains("from=2015-01-01"));
        assert!(url.contains("to=2016-03-26"));
    }

    #[test]
    fn declares_chunking() {
        let spec = endpoint().chunking().unwrap();
        assert_eq!(spec.window_days, DEFAULT_WINDOW_DAYS);
    }
}
