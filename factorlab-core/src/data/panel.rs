//! Panel construction — reshaping per-symbol artifacts into wide,
//! date-keyed tables for the processed and core_data tiers.
//!
//! A field panel has one row per date and one column per symbol:
//! per-symbol `[date, field]` projections are outer-joined on date with
//! coalescing, de-duplicated on date (first wins), and sorted ascending.

use super::store::{DataStore, DirectorySnapshot, StoreError};
use chrono::NaiveDate;
use polars::prelude::*;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PanelError {
    #[error("panel algebra error: {0}")]
    Polars(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

fn polars_err(e: PolarsError) -> PanelError {
    PanelError::Polars(e.to_string())
}

/// Merge one field across every artifact in a snapshot into a wide panel.
///
/// Artifacts lacking the field (or a date column) are excluded with a
/// warning; if nothing qualifies the result is the empty frame.
pub fn get_field(snapshot: &DirectorySnapshot, field: &str) -> Result<DataFrame, PanelError> {
    let mut merged: Option<LazyFrame> = None;

    for (symbol, artifact) in &snapshot.artifacts {
        let frame = &artifact.frame;
        if frame.column("date").is_err() || frame.column(field).is_err() {
            tracing::warn!(symbol = %symbol, field, "field absent, excluded from panel");
            continue;
        }
        let projected = frame
            .clone()
            .lazy()
            .select([col("date"), col(field).alias(symbol.as_str())]);
        merged = Some(match merged {
            None => projected,
            Some(acc) => acc.join(
                projected,
                [col("date")],
                [col("date")],
                JoinArgs::new(JoinType::Full).with_coalesce(JoinCoalesce::CoalesceColumns),
            ),
        });
    }

    let Some(joined) = merged else {
        return Ok(DataFrame::default());
    };

    joined
        .group_by_stable([col("date")])
        .agg([all().first()])
        .sort(["date"], SortMultipleOptions::default())
        .collect()
        .map_err(polars_err)
}

/// Fractional change over `lookback` rows for every non-date column:
/// `(x - x.shift(n)) / x.shift(n)`.
pub fn pct_change(panel: &DataFrame, lookback: i64) -> Result<DataFrame, PanelError> {
    let mut exprs: Vec<Expr> = vec![col("date")];
    for name in panel.get_column_names() {
        if name.as_str() == "date" {
            continue;
        }
        let c = col(name.as_str());
        exprs.push(
            ((c.clone() - c.clone().shift(lit(lookback))) / c.shift(lit(lookback)))
                .alias(name.as_str()),
        );
    }
    panel.clone().lazy().select(exprs).collect().map_err(polars_err)
}

/// Build the adjusted-close panel and the daily total-return panel from the
/// raw price artifacts, writing both to the processed tier.
pub fn build_processed_prices(
    store: &DataStore,
    universe: &[String],
) -> Result<DataFrame, PanelError> {
    let snapshot = store.read_all("prices", universe)?;
    let prices = get_field(&snapshot, "adjClose")?;
    store.write("processed/market_data", "prices", &prices, None)?;

    let total_return = pct_change(&prices, 1)?;
    store.write("processed/market_data", "total_return", &total_return, None)?;
    Ok(total_return)
}

/// Build the market-cap panel from the raw market-cap artifacts.
pub fn build_processed_marketcaps(
    store: &DataStore,
    universe: &[String],
) -> Result<DataFrame, PanelError> {
    let snapshot = store.read_all("marketcap", universe)?;
    let caps = get_field(&snapshot, "marketCap")?;
    store.write("processed/market_data", "marketcap", &caps, None)?;
    Ok(caps)
}

/// Stack every stored profile into one frame, diagonally concatenated so
/// symbols with missing fields still line up.
pub fn combine_profiles(store: &DataStore, universe: &[String]) -> Result<DataFrame, PanelError> {
    let snapshot = store.read_all("profiles", universe)?;
    let frames: Vec<LazyFrame> = snapshot
        .artifacts
        .values()
        .filter(|a| a.frame.height() > 0)
        .map(|a| a.frame.clone().lazy())
        .collect();
    if frames.is_empty() {
        return Ok(DataFrame::default());
    }

    let combined = concat(
        frames,
        UnionArgs {
            diagonal: true,
            ..Default::default()
        },
    )
    .map_err(polars_err)?
    .collect()
    .map_err(polars_err)?;

    store.write("processed", "all_profiles", &combined, None)?;
    Ok(combined)
}

/// The base frame every downstream panel is reindexed by: total returns from
/// `start_date` on, keeping only rows where at least one symbol has a finite
/// value.
pub fn build_base_frame(store: &DataStore, start_date: NaiveDate) -> Result<DataFrame, PanelError> {
    let total_return = store.read("processed/market_data", "total_return")?;

    let value_columns: Vec<String> = total_return
        .get_column_names()
        .iter()
        .filter(|n| n.as_str() != "date")
        .map(|n| n.to_string())
        .collect();

    let mut sliced = total_return
        .lazy()
        .filter(col("date").gt_eq(lit(start_date)));

    if !value_columns.is_empty() {
        let predicates: Vec<Expr> = value_columns
            .iter()
            .map(|n| col(n.as_str()).is_finite().fill_null(lit(false)))
            .collect();
        let keep = any_horizontal(predicates).map_err(polars_err)?;
        sliced = sliced.filter(keep);
    }

    let frame = sliced.collect().map_err(polars_err)?;
    store.write("core_data", "base_frame", &frame, None)?;
    Ok(frame)
}
