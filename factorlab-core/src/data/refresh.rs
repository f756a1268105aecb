//! Refresh orchestration — expands a job into request units, drives them
//! through the rate-limited client, and commits successful results.
//!
//! One refresh per engine at a time: the engine owns an explicit in-progress
//! guard and fails fast if re-invoked while a run it owns is outstanding.
//! It never probes ambient scheduler state.

use super::chunker::date_windows;
use super::client::RateLimitedClient;
use super::provider::{DateWindow, Endpoint, FetchError, FetchOutcome, RequestUnit};
use super::store::{ArtifactMeta, DataStore};
use futures::future::join_all;
use polars::prelude::DataFrame;
use std::sync::atomic::{AtomicBool, Ordering};

/// Per-job outcome counts. Failed symbols are simply absent from the store
/// for this run; the caller learns of them here and through the logs, never
/// through a raised error for the whole batch.
#[derive(Debug)]
pub struct RefreshSummary {
    pub total: usize,
    pub stored: usize,
    pub skipped: usize,
}

impl RefreshSummary {
    pub fn all_stored(&self) -> bool {
        self.skipped == 0
    }
}

/// Drives fetch jobs: symbol fan-out, per-symbol window aggregation, and
/// store commits.
pub struct RefreshEngine {
    client: RateLimitedClient,
    store: DataStore,
    in_progress: AtomicBool,
}

/// Clears the in-progress flag when a run exits, on every path.
struct RunGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, FetchError> {
        if flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(FetchError::AlreadyRunning);
        }
        Ok(Self { flag })
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl RefreshEngine {
    pub fn new(client: RateLimitedClient, store: DataStore) -> Self {
        Self {
            client,
            store,
            in_progress: AtomicBool::new(false),
        }
    }

    pub fn store(&self) -> &DataStore {
        &self.store
    }

    /// Refresh one dataset for the whole symbol universe.
    ///
    /// All symbols are driven concurrently; the only cross-task bound is the
    /// client's admission gate. Exactly one store write per symbol per run,
    /// and only for non-empty results. Store failures are logged and skipped
    /// so one bad symbol cannot abort the batch.
    pub async fn refresh(
        &self,
        endpoint: &dyn Endpoint,
        symbols: &[String],
    ) -> Result<RefreshSummary, FetchError> {
        let _guard = RunGuard::acquire(&self.in_progress)?;

        tracing::info!(
            endpoint = endpoint.name(),
            symbols = symbols.len(),
            "refresh started"
        );

        let outcomes = match endpoint.chunking() {
            None => {
                join_all(symbols.iter().map(|symbol| {
                    self.client
                        .fetch(RequestUnit::whole_history(symbol.clone()), endpoint)
                }))
                .await
            }
            Some(spec) => {
                let today = chrono::Local::now().date_naive();
                let windows = date_windows(spec.start_date, today, spec.window_days);
                join_all(
                    symbols
                        .iter()
                        .map(|symbol| self.fetch_windowed(symbol, &windows, endpoint)),
                )
                .await
            }
        };

        let mut stored = 0;
        let mut skipped = 0;
        for outcome in outcomes {
            if !outcome.succeeded() {
                tracing::warn!(symbol = %outcome.symbol, endpoint = endpoint.name(), "no data, skipping");
                skipped += 1;
                continue;
            }
            let meta = ArtifactMeta::received_now(&outcome);
            match self.store.write(
                &endpoint.sub_directory(),
                &outcome.symbol,
                &outcome.frame,
                Some(meta),
            ) {
                Ok(()) => stored += 1,
                Err(e) => {
                    tracing::error!(symbol = %outcome.symbol, error = %e, "store write failed, skipping");
                    skipped += 1;
                }
            }
        }

        let summary = RefreshSummary {
            total: symbols.len(),
            stored,
            skipped,
        };
        tracing::info!(
            endpoint = endpoint.name(),
            stored = summary.stored,
            skipped = summary.skipped,
            "refresh complete"
        );
        Ok(summary)
    }

    /// Fetch every window for one symbol concurrently and concatenate the
    /// non-empty results in window-chronological order.
    ///
    /// `join_all` yields results in input order, so chronology is preserved
    /// no matter which window's response lands first.
    async fn fetch_windowed(
        &self,
        symbol: &str,
        windows: &[DateWindow],
        endpoint: &dyn Endpoint,
    ) -> FetchOutcome {
        let parts = join_all(
            windows
                .iter()
                .map(|w| self.client.fetch(RequestUnit::windowed(symbol, *w), endpoint)),
        )
        .await;

        let mut combined: Option<DataFrame> = None;
        for part in parts {
            if part.frame.height() == 0 {
                continue;
            }
            combined = match combined {
                None => Some(part.frame),
                Some(acc) => match acc.vstack(&part.frame) {
                    Ok(stacked) => Some(stacked),
                    Err(e) => {
                        tracing::error!(symbol, error = %e, "window concatenation failed");
                        return FetchOutcome::empty(symbol);
                    }
                },
            };
        }

        match combined {
            Some(frame) => FetchOutcome {
                symbol: symbol.to_string(),
                frame,
            },
            None => FetchOutcome::empty(symbol),
        }
    }
}
