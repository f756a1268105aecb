//! Date chunking for range-capped endpoints.
//!
//! Some upstream endpoints (market capitalization history) cap the date range
//! returned per call, so a long backfill is split into bounded windows.

use super::provider::DateWindow;
use chrono::{Duration, NaiveDate};

/// Default window width. The upstream cap is a little above this; 450 days
/// leaves headroom for the provider counting calendar days inclusively.
pub const DEFAULT_WINDOW_DAYS: i64 = 450;

/// Split `[start, today]` into contiguous, non-overlapping windows of at most
/// `window_days` days, in chronological order, with the final window clipped
/// to `today`. Returns no windows when `start` is not before `today`.
pub fn date_windows(start: NaiveDate, today: NaiveDate, window_days: i64) -> Vec<DateWindow> {
    let mut windows = Vec::new();
    let mut current_start = start;

    while current_start < today {
        let current_end = (current_start + Duration::days(window_days)).min(today);
        windows.push(DateWindow {
            start: current_start,
            end: current_end,
        });
        current_start = current_end + Duration::days(1);
    }

    windows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn covers_range_with_clipped_tail() {
        let windows = date_windows(d("2020-01-01"), d("2021-06-01"), 450);
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].start, d("2020-01-01"));
        assert_eq!(windows[0].end, d("2021-03-26"));
        assert_eq!(windows[1].start, d("2021-03-27"));
        // last window clipped to today
        assert_eq!(windows[1].end, d("2021-06-01"));
    }

    #[test]
    fn windows_are_contiguous_and_non_overlapping() {
        let windows = date_windows(d("2010-03-15"), d("2024-11-02"), 450);
        for pair in windows.windows(2) {
            assert_eq!(pair[1].start, pair[0].end + Duration::days(1));
        }
    }

    #[test]
    fn short_range_yields_single_window() {
        let windows = date_windows(d("2024-01-01"), d("2024-02-01"), 450);
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].end, d("2024-02-01"));
    }

    #[test]
    fn empty_when_start_not_before_today() {
        assert!(date_windows(d("2024-02-01"), d("2024-02-01"), 450).is_empty());
        assert!(date_windows(d("2024-03-01"), d("2024-02-01"), 450).is_empty());
    }
}
