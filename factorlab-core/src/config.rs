//! Serializable refresh configuration.
//!
//! Everything an unattended refresh run needs except the API key, which only
//! ever comes from the environment.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Engine settings, loadable from a TOML file.
///
/// Dates must be quoted strings in the TOML (`start_date = "1990-01-01"`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RefreshConfig {
    /// Root directory of the columnar store.
    pub store_dir: PathBuf,

    /// Universe TOML file. When absent the S&P 500 constituent list is
    /// fetched live.
    pub universe_file: Option<PathBuf>,

    /// Maximum concurrently in-flight HTTP requests.
    pub rate_limit: usize,

    /// Attempts per request unit before a symbol is dropped for the run.
    pub max_retries: u32,

    /// First date of history to request for chunked endpoints, and the slice
    /// point of the base frame.
    pub start_date: NaiveDate,

    /// Window width for date-chunked endpoints, in days.
    pub chunk_days: i64,

    /// Reporting periods to fetch statements for.
    pub statement_periods: Vec<String>,

    /// SEC form types to fetch filing indexes for.
    pub sec_forms: Vec<String>,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from("data/local_store"),
            universe_file: None,
            rate_limit: 275,
            max_retries: 3,
            start_date: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            chunk_days: 450,
            statement_periods: vec!["annual".to_string(), "quarter".to_string()],
            sec_forms: vec!["10-K".to_string(), "10-Q".to_string()],
        }
    }
}

impl RefreshConfig {
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path).map_err(|e| format!("read config: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("parse config TOML: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = RefreshConfig::default();
        assert_eq!(config.rate_limit, 275);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.chunk_days, 450);
        assert_eq!(config.statement_periods, vec!["annual", "quarter"]);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: RefreshConfig =
            toml::from_str(r#"rate_limit = 10"#).unwrap();
        assert_eq!(config.rate_limit, 10);
        assert_eq!(config.max_retries, RefreshConfig::default().max_retries);
    }

    #[test]
    fn full_toml_roundtrip() {
        let config = RefreshConfig {
            store_dir: PathBuf::from("/tmp/store"),
            universe_file: Some(PathBuf::from("universe.toml")),
            rate_limit: 50,
            max_retries: 5,
            start_date: NaiveDate::from_ymd_opt(2005, 6, 1).unwrap(),
            chunk_days: 365,
            statement_periods: vec!["annual".into()],
            sec_forms: vec!["10-K".into()],
        };
        let serialized = toml::to_string(&config).unwrap();
        let parsed: RefreshConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed, config);
    }
}
