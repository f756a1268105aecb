//! Daily price history endpoint.
//!
//! `historical-price-full/{symbol}` returns the whole adjusted history in one
//! payload, newest first. The transform casts the price fields to float64 and
//! materializes a proper Date column; row order is left as delivered, panel
//! construction sorts later.

use super::super::provider::{DateWindow, Endpoint, FetchError};
use super::{days_since_epoch, FMP_BASE_URL};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct HistoricalPayload {
    #[serde(default)]
    historical: Vec<PriceRecord>,
}

#[derive(Debug, Deserialize)]
struct PriceRecord {
    date: String,
    #[serde(default)]
    open: Option<f64>,
    #[serde(default)]
    high: Option<f64>,
    #[serde(default)]
    low: Option<f64>,
    #[serde(default)]
    close: Option<f64>,
    #[serde(rename = "adjClose", default)]
    adj_close: Option<f64>,
    #[serde(default)]
    volume: Option<f64>,
}

pub struct PricesEndpoint {
    api_key: String,
}

impl PricesEndpoint {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }
}

impl Endpoint for PricesEndpoint {
    fn name(&self) -> &'static str {
        "prices"
    }

    fn sub_directory(&self) -> String {
        "prices".to_string()
    }

    fn build_url(&self, symbol: &str, _window: Option<&DateWindow>) -> String {
        format!(
            "{FMP_BASE_URL}/historical-price-full/{symbol}?from=1900-01-01&apikey={}",
            self.api_key
        )
    }

    fn transform(&self, body: &str) -> Result<DataFrame, FetchError> {
        let payload: HistoricalPayload =
            serde_json::from_str(body).map_err(|e| FetchError::Malformed(e.to_string()))?;
        if payload.historical.is_empty() {
            return Ok(DataFrame::default());
        }

        let mut dates = Vec::with_capacity(payload.historical.len());
        for record in &payload.historical {
            let date = NaiveDate::parse_from_str(&record.date, "%Y-%m-%d")
                .map_err(|e| FetchError::Malformed(format!("date '{}': {e}", record.date)))?;
            dates.push(days_since_epoch(date));
        }

        let field = |get: fn(&PriceRecord) -> Option<f64>| -> Vec<f64> {
            payload
                .historical
                .iter()
                .map(|r| get(r).unwrap_or(f64::NAN))
                .collect()
        };

        DataFrame::new(vec![
            Column::new("date".into(), dates)
                .cast(&DataType::Date)
                .map_err(|e| FetchError::Malformed(format!("date cast: {e}")))?,
            Column::new("open".into(), field(|r| r.open)),
            Column::new("high".into(), field(|r| r.high)),
            Column::new("low".into(), field(|r| r.low)),
            Column::new("close".into(), field(|r| r.close)),
            Column::new("adjClose".into(), field(|r| r.adj_close)),
            Column::new("volume".into(), field(|r| r.volume)),
        ])
        .map_err(|e| FetchError::Malformed(format!("frame creation: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transforms_historical_payload() {
        let endpoint = PricesEndpoint::new("k");
        let body = r#"{
            "symbol": "AAPL",
            "historical": [
                {"date": "2024-01-03", "open": 184.2, "high": 185.9, "low": 183.4, "close": 184.25, "adjClose": 184.0, "volume": 58414500},
                {"date": "2024-01-02", "open": 187.2, "high": 188.4, "low": 183.9, "close": 185.64, "adjClose": 185.4, "volume": 82488700}
            ]
        }"#;

        let frame = endpoint.transform(body).unwrap();
        assert_eq!(frame.height(), 2);
        assert_eq!(
            frame.column("adjClose").unwrap().f64().unwrap().get(0),
            Some(184.0)
        );
        assert_eq!(frame.column("date").unwrap().dtype(), &DataType::Date);
    }

    #[test]
    fn missing_historical_is_empty() {
        let endpoint = PricesEndpoint::new("k");
        assert_eq!(endpoint.transform("{}").unwrap().height(), 0);
        assert_eq!(
            endpoint
                .transform(r#"{"Error Message": "Limit Reach"}"#)
                .unwrap()
                .height(),
            0
        );
    }

    #[test]
    fn absent_price_fields_become_nan() {
        let endpoint = PricesEndpoint::new("k");
        let body = r#"{"historical": [{"date": "2024-01-02"}]}"#;
        let frame = endpoint.transform(body).unwrap();
        assert!(frame
            .column("close")
            .unwrap()
            .f64()
            .unwrap()
            .get(0)
            .unwrap()
            .is_nan());
    }

    #[test]
    fn garbled_date_is_malformed() {
        let endpoint = PricesEndpoint::new("k");
        let body = r#"{"historical": [{"date": "tomorrow"}]}"#;
        assert!(matches!(
            endpoint.transform(body),
            Err(FetchError::Malformed(_))
        ));
    }

    #[test]
    fn url_contains_symbol_and_key() {
        let endpoint = PricesEndpoint::new("secret");
        let url = endpoint.build_url("AAPL", None);
        assert!(url.contains("/historical-price-full/AAPL"));
        assert!(url.contains("apikey=secret"));
    }
}
