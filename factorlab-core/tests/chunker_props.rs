//! Property tests for the date chunker.

use chrono::{Duration, NaiveDate};
use factorlab_core::data::date_windows;
use proptest::prelude::*;

proptest! {
    #[test]
    fn windows_partition_the_range(
        start_offset in 0i64..15_000,
        span in 1i64..4_000,
        width in 1i64..900,
    ) {
        let start = NaiveDate::from_ymd_opt(1980, 1, 1).unwrap() + Duration::days(start_offset);
        let today = start + Duration::days(span);
        let windows = date_windows(start, today, width);

        prop_assert!(!windows.is_empty());
        prop_assert_eq!(windows[0].start, start);

        // each window is well-formed and within the width bound
        for w in &windows {
            prop_assert!(w.start <= w.end);
            prop_assert!(w.end - w.start <= Duration::days(width));
        }

        // contiguous and non-overlapping
        for pair in windows.windows(2) {
            prop_assert_eq!(pair[1].start, pair[0].end + Duration::days(1));
        }

        // the tail is clipped to today (the next window would start past it)
        let last = windows.last().unwrap();
        prop_assert!(last.end <= today);
        prop_assert!(last.end + Duration::days(1) > today || last.end == today);
    }

    #[test]
    fn no_windows_for_empty_or_inverted_ranges(offset in 0i64..1_000) {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let start = today + Duration::days(offset);
        prop_assert!(date_windows(start, today, 450).is_empty());
    }
}
