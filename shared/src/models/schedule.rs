//! Weekly irrigation-schedule and agronomy rows

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calendar::{self, plain_week_label, week_label, week_range};
use crate::compliance::compliance_percent;
use crate::types::{DateRange, WEEKS_PER_SEASON};

/// A row addressed by its week position in a season table
pub trait WeekRow {
    /// Empty row for position `index`
    fn blank(index: usize) -> Self;

    fn label(&self) -> &str;

    /// Structured week range, when one was stored
    fn range(&self) -> Option<DateRange>;

    fn set_calendar(&mut self, label: String, range: DateRange);

    /// Whether this row's week overlaps `window`.
    ///
    /// Uses the stored range first and falls back to the label text.
    fn overlaps(&self, window: &DateRange) -> bool {
        match self.range() {
            Some(range) => range.overlaps(window),
            None => calendar::match_row_to_window(
                self.label(),
                window.start,
                window.end,
                calendar::window_year(window),
            ),
        }
    }
}

/// Season table with a fixed capacity of 52 weekly rows
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(transparent)]
pub struct WeekTable<T> {
    rows: Vec<T>,
}

impl<T: WeekRow> WeekTable<T> {
    /// Table of blank rows
    pub fn new() -> Self {
        Self {
            rows: (0..WEEKS_PER_SEASON).map(T::blank).collect(),
        }
    }

    /// Build from submitted rows; extra rows are dropped, missing rows are blank
    pub fn from_rows(rows: Vec<T>) -> Self {
        let mut rows: Vec<T> = rows.into_iter().take(WEEKS_PER_SEASON).collect();
        while rows.len() < WEEKS_PER_SEASON {
            rows.push(T::blank(rows.len()));
        }
        Self { rows }
    }

    /// Row at a resolved week index; negative or past-the-end is `None`
    pub fn get(&self, index: i64) -> Option<&T> {
        usize::try_from(index).ok().and_then(|i| self.rows.get(i))
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.rows.get_mut(index)
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Relabel every row from the plot's first Monday
    pub fn apply_calendar(&mut self, first_monday: NaiveDate) {
        for (i, row) in self.rows.iter_mut().enumerate() {
            let range = week_range(first_monday, i);
            row.set_calendar(week_label(i, &range), range);
        }
    }

    /// Rows whose week overlaps `window`, in table order
    pub fn in_window<'a>(&'a self, window: &'a DateRange) -> impl Iterator<Item = &'a T> + 'a {
        self.rows.iter().filter(move |row| row.overlaps(window))
    }
}

impl<T: WeekRow> Default for WeekTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T> IntoIterator for &'a WeekTable<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// One week of scheduled versus delivered irrigation
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WeeklyScheduleRow {
    pub label: String,
    pub range: Option<DateRange>,
    /// Scheduled depth (mm)
    pub scheduled: Option<Decimal>,
    /// Applied depth (mm)
    pub actual: Option<Decimal>,
    /// Effective rainfall (mm)
    pub effective_rain: Option<Decimal>,
    /// Compliance percent, computed when the row is saved
    pub percent: Option<Decimal>,
    pub comment: String,
}

impl WeeklyScheduleRow {
    /// Actual plus effective rain; `None` when neither was entered or the sum overflows
    pub fn delivered(&self) -> Option<Decimal> {
        if self.actual.is_none() && self.effective_rain.is_none() {
            return None;
        }
        self.actual
            .unwrap_or_default()
            .checked_add(self.effective_rain.unwrap_or_default())
    }

    /// Compliance for this row alone
    pub fn compute_percent(&self) -> Option<Decimal> {
        let delivered = self.delivered()?;
        compliance_percent(self.scheduled.unwrap_or_default(), delivered, Decimal::ZERO)
    }

    pub fn has_data(&self) -> bool {
        self.actual.is_some() || self.effective_rain.is_some()
    }
}

impl WeekRow for WeeklyScheduleRow {
    fn blank(index: usize) -> Self {
        Self {
            label: plain_week_label(index),
            ..Default::default()
        }
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn range(&self) -> Option<DateRange> {
        self.range
    }

    fn set_calendar(&mut self, label: String, range: DateRange) {
        self.label = label;
        self.range = Some(range);
    }
}

impl WeekTable<WeeklyScheduleRow> {
    /// Recompute every row's stored compliance percent
    pub fn recompute_percents(&mut self) {
        for row in self.rows.iter_mut() {
            row.percent = row.compute_percent();
        }
    }
}

/// One week of crop growth and applied inputs
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AgronomyWeekRow {
    pub label: String,
    pub range: Option<DateRange>,
    /// Growth gained this week (cm)
    pub gain: Option<Decimal>,
    /// Running total of gains up to this week (cm)
    pub cumulative: Option<Decimal>,
    pub fertigation: String,
    pub chemigation: String,
}

impl WeekRow for AgronomyWeekRow {
    fn blank(index: usize) -> Self {
        Self {
            label: plain_week_label(index),
            ..Default::default()
        }
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn range(&self) -> Option<DateRange> {
        self.range
    }

    fn set_calendar(&mut self, label: String, range: DateRange) {
        self.label = label;
        self.range = Some(range);
    }
}

impl WeekTable<AgronomyWeekRow> {
    /// Rebuild the cumulative column; rows without a gain carry none
    pub fn recompute_cumulative(&mut self) {
        let mut running = Decimal::ZERO;
        for row in self.rows.iter_mut() {
            row.cumulative = row.gain.map(|gain| {
                running = running.saturating_add(gain);
                running.round_dp(1)
            });
        }
    }
}
