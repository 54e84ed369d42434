//! Week calendar integration tests
//!
//! Tests for Monday-aligned week arithmetic including:
//! - Week index resolution from a plot's reference date
//! - Calendar windows for the current and previous week
//! - Matching labelled rows to a window

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use proptest::prelude::*;
use shared::calendar::{
    current_calendar_week, match_row_to_window, parse_label_range, previous_calendar_week,
    resolve_week_index, week_label, week_range,
};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Reference on a Wednesday: the first week still starts on its Monday
    #[test]
    fn test_first_week_spans_reference_week() {
        let reference = d(2024, 1, 3);
        assert_eq!(resolve_week_index(Some(reference), d(2024, 1, 2)), None);
        assert_eq!(resolve_week_index(Some(reference), reference), Some(0));
        assert_eq!(resolve_week_index(Some(reference), d(2024, 1, 7)), Some(0));
        assert_eq!(resolve_week_index(Some(reference), d(2024, 1, 8)), Some(1));
        assert_eq!(resolve_week_index(None, d(2024, 1, 8)), None);
    }

    #[test]
    fn test_index_has_no_upper_bound() {
        assert_eq!(
            resolve_week_index(Some(d(2023, 1, 2)), d(2024, 6, 3)),
            Some(74)
        );
    }

    #[test]
    fn test_label_matches_its_own_week() {
        let label = "Week 3 (10 Feb–16 Feb)";
        assert!(match_row_to_window(label, d(2024, 2, 10), d(2024, 2, 16), 2024));
        assert!(!match_row_to_window(label, d(2024, 2, 17), d(2024, 2, 23), 2024));
    }

    #[test]
    fn test_unparseable_labels_never_match() {
        assert!(!match_row_to_window("Week 3", d(2024, 2, 10), d(2024, 2, 16), 2024));
        assert!(!match_row_to_window(
            "Week 3 (10 Feb-16 Feb)",
            d(2024, 2, 10),
            d(2024, 2, 16),
            2024
        ));
        assert!(!match_row_to_window(
            "Week 3 (31 Feb–06 Mar)",
            d(2024, 2, 26),
            d(2024, 3, 3),
            2024
        ));
    }

    #[test]
    fn test_label_spanning_new_year() {
        let range = parse_label_range("Week 52 (30 Dec–05 Jan)", 2024).unwrap();
        assert_eq!(range.start, d(2024, 12, 30));
        assert_eq!(range.end, d(2025, 1, 5));
    }

    #[test]
    fn test_week_label_format() {
        let range = week_range(d(2024, 2, 5), 1);
        assert_eq!(week_label(1, &range), "Week 2 (12 Feb–18 Feb)");
    }

    #[test]
    fn test_previous_week_window() {
        let window = previous_calendar_week(d(2024, 3, 13));
        assert_eq!(window.start, d(2024, 3, 4));
        assert_eq!(window.end, d(2024, 3, 10));
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Dates across 2023–2026
    fn date_strategy() -> impl Strategy<Value = NaiveDate> {
        (0i64..1460i64).prop_map(|offset| d(2023, 1, 1) + Duration::days(offset))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Any query before the reference date has no week
        #[test]
        fn prop_before_reference_is_none(reference in date_strategy(), back in 1i64..400i64) {
            prop_assert_eq!(resolve_week_index(Some(reference), reference - Duration::days(back)), None);
        }

        /// From the reference date through its Sunday the index is 0
        #[test]
        fn prop_reference_week_is_index_zero(reference in date_strategy()) {
            let days_to_sunday = 6 - i64::from(reference.weekday().num_days_from_monday());
            for offset in 0..=days_to_sunday {
                prop_assert_eq!(
                    resolve_week_index(Some(reference), reference + Duration::days(offset)),
                    Some(0)
                );
            }
            prop_assert_eq!(
                resolve_week_index(Some(reference), reference + Duration::days(days_to_sunday + 1)),
                Some(1)
            );
        }

        /// Calendar windows are Monday to Sunday and adjacent
        #[test]
        fn prop_calendar_windows(today in date_strategy()) {
            let current = current_calendar_week(today);
            let previous = previous_calendar_week(today);

            prop_assert_eq!(current.start.weekday(), Weekday::Mon);
            prop_assert_eq!(current.end.weekday(), Weekday::Sun);
            prop_assert!(current.contains(today));
            prop_assert_eq!(previous.end + Duration::days(1), current.start);
        }

        /// A generated label matches its own week and not the next one
        #[test]
        fn prop_generated_label_round_trips(monday_offset in 0i64..200i64, index in 0usize..52usize) {
            let first_monday = d(2023, 1, 2) + Duration::days(7 * monday_offset);
            let range = week_range(first_monday, index);
            let label = week_label(index, &range);
            let year = range.start.year();

            prop_assert!(match_row_to_window(&label, range.start, range.end, year));
            prop_assert!(!match_row_to_window(
                &label,
                range.end + Duration::days(1),
                range.end + Duration::days(7),
                year
            ));
        }
    }
}
