//! Monday-aligned week arithmetic
//!
//! Weekly rows are addressed two ways: by index from a plot's reference date
//! (`resolve_week_index`), and by calendar window using the date range each
//! row carries (`match_row_to_window` parses it back out of the label when no
//! structured range was stored).

use chrono::{Datelike, Duration, NaiveDate};

use crate::models::plot::monday_of;
use crate::types::DateRange;

/// Separator between the two dates inside a week label
pub const RANGE_DASH: char = '–';

/// Zero-based week index of `query_date` counted from the Monday of
/// `reference_date`'s week.
///
/// `None` when there is no reference date or the query precedes it. No upper
/// bound is applied; the row table decides whether the index exists.
pub fn resolve_week_index(reference_date: Option<NaiveDate>, query_date: NaiveDate) -> Option<i64> {
    let reference = reference_date?;
    if query_date < reference {
        return None;
    }
    let first_monday = monday_of(reference);
    Some((query_date - first_monday).num_days().div_euclid(7))
}

/// Monday–Sunday window containing `today`
pub fn current_calendar_week(today: NaiveDate) -> DateRange {
    let monday = monday_of(today);
    DateRange::new(monday, monday + Duration::days(6))
}

/// Monday–Sunday window of the week before `today`'s
pub fn previous_calendar_week(today: NaiveDate) -> DateRange {
    let monday = current_calendar_week(today).start - Duration::days(7);
    DateRange::new(monday, monday + Duration::days(6))
}

/// Range of the week at `index` from `first_monday`
pub fn week_range(first_monday: NaiveDate, index: usize) -> DateRange {
    let start = first_monday + Duration::days(7 * index as i64);
    DateRange::new(start, start + Duration::days(6))
}

/// Display label, e.g. `Week 3 (10 Feb–16 Feb)`
pub fn week_label(index: usize, range: &DateRange) -> String {
    format!(
        "Week {} ({}{}{})",
        index + 1,
        range.start.format("%d %b"),
        RANGE_DASH,
        range.end.format("%d %b")
    )
}

/// Plain label used before a reference date is known
pub fn plain_week_label(index: usize) -> String {
    format!("Week {}", index + 1)
}

/// Recover the date range embedded in a week label.
///
/// Both `DD Mon` tokens get `year_hint`; if the end falls before the start
/// the week spans New Year and the end moves into the following year.
pub fn parse_label_range(label: &str, year_hint: i32) -> Option<DateRange> {
    let open = label.find('(')?;
    let inner = &label[open + 1..];
    let inner = &inner[..inner.find(')')?];
    let (first, second) = inner.split_once(RANGE_DASH)?;

    let start = parse_day_month(first, year_hint)?;
    let mut end = parse_day_month(second, year_hint)?;
    if end < start {
        end = parse_day_month(second, year_hint + 1)?;
    }
    Some(DateRange::new(start, end))
}

fn parse_day_month(token: &str, year: i32) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{} {}", token.trim(), year), "%d %b %Y").ok()
}

/// Whether the range embedded in `week_label` overlaps `[window_start, window_end]`.
///
/// Labels without a parseable range never match.
pub fn match_row_to_window(
    week_label: &str,
    window_start: NaiveDate,
    window_end: NaiveDate,
    year_hint: i32,
) -> bool {
    match parse_label_range(week_label, year_hint) {
        Some(range) => range.overlaps(&DateRange::new(window_start, window_end)),
        None => false,
    }
}

/// Year attached to label tokens when matching against `window`
pub fn window_year(window: &DateRange) -> i32 {
    window.start.year()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_week_index_before_reference() {
        assert_eq!(resolve_week_index(Some(d(2024, 1, 10)), d(2024, 1, 9)), None);
        assert_eq!(resolve_week_index(None, d(2024, 1, 9)), None);
    }

    #[test]
    fn test_week_index_first_week() {
        // Wednesday reference: week 0 runs from Monday 8th to Sunday 14th
        let reference = Some(d(2024, 1, 10));
        assert_eq!(resolve_week_index(reference, d(2024, 1, 10)), Some(0));
        assert_eq!(resolve_week_index(reference, d(2024, 1, 14)), Some(0));
        assert_eq!(resolve_week_index(reference, d(2024, 1, 15)), Some(1));
        assert_eq!(resolve_week_index(reference, d(2025, 1, 15)), Some(53));
    }

    #[test]
    fn test_calendar_weeks() {
        // Thursday
        let today = d(2024, 2, 22);
        assert_eq!(current_calendar_week(today), DateRange::new(d(2024, 2, 19), d(2024, 2, 25)));
        assert_eq!(previous_calendar_week(today), DateRange::new(d(2024, 2, 12), d(2024, 2, 18)));
        // Monday stays in its own week
        assert_eq!(previous_calendar_week(d(2024, 2, 19)).start, d(2024, 2, 12));
    }

    #[test]
    fn test_label_round_trip() {
        let range = week_range(d(2024, 1, 29), 2);
        let label = week_label(2, &range);
        assert_eq!(label, "Week 3 (12 Feb–18 Feb)");
        assert_eq!(parse_label_range(&label, 2024), Some(range));
    }

    #[test]
    fn test_label_matching() {
        let label = "Week 3 (10 Feb–16 Feb)";
        assert!(match_row_to_window(label, d(2024, 2, 10), d(2024, 2, 16), 2024));
        assert!(!match_row_to_window(label, d(2024, 2, 17), d(2024, 2, 23), 2024));
        assert!(!match_row_to_window("Week 3", d(2024, 2, 10), d(2024, 2, 16), 2024));
        assert!(!match_row_to_window("Week 3 (10 Feb-16 Feb)", d(2024, 2, 10), d(2024, 2, 16), 2024));
        assert!(!match_row_to_window("Week 3 (xx Feb–16 Feb)", d(2024, 2, 10), d(2024, 2, 16), 2024));
    }

    #[test]
    fn test_label_spanning_new_year() {
        let range = parse_label_range("Week 9 (30 Dec–05 Jan)", 2024).unwrap();
        assert_eq!(range, DateRange::new(d(2024, 12, 30), d(2025, 1, 5)));
    }
}
