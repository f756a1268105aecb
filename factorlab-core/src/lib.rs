//! FactorLab Core — concurrent fetch-and-persist engine for per-symbol
//! financial time series.
//!
//! The heart of the crate:
//! - Rate-limited fetch client (admission gate + bounded retries + 429 backoff)
//! - Refresh orchestrator (symbol fan-out, date-chunk aggregation, store commits)
//! - Parquet-backed columnar store (atomic writes, attribution sidecars)
//! - Endpoint handlers for the FMP datasets
//! - Panel algebra for the processed and core_data tiers

pub mod config;
pub mod data;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: engine types cross task boundaries, so they must
    /// be Send + Sync. If any type fails this check, the build breaks
    /// immediately.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<data::RateLimitedClient>();
        require_sync::<data::RateLimitedClient>();
        require_send::<data::RefreshEngine>();
        require_sync::<data::RefreshEngine>();
        require_send::<data::DataStore>();
        require_sync::<data::DataStore>();
        require_send::<data::FetchOutcome>();
        require_send::<data::RequestUnit>();
        require_sync::<data::RequestUnit>();
        require_send::<data::Universe>();
        require_sync::<data::Universe>();
        require_send::<config::RefreshConfig>();
        require_sync::<config::RefreshConfig>();
    }
}
