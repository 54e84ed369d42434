//! Common types used across the platform

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Default soil-moisture starting balance (and ceiling) in mm
pub const DEFAULT_STARTING_BALANCE_MM: Decimal = Decimal::from_parts(120, 0, 0, false, 0);

/// Number of weekly rows kept per plot (one season)
pub const WEEKS_PER_SEASON: usize = 52;

/// Maximum number of plots shown on the focus chart
pub const FOCUS_PLOT_LIMIT: usize = 6;

/// Inclusive calendar date range
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// True when the two inclusive ranges share at least one day
    pub fn overlaps(&self, other: &DateRange) -> bool {
        !(self.end < other.start || self.start > other.end)
    }
}

/// Sum that gives up instead of overflowing
pub fn checked_sum<'a>(values: impl IntoIterator<Item = &'a Decimal>) -> Option<Decimal> {
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, value| acc.checked_add(*value))
}

/// Arithmetic mean; `None` when empty or when the sum overflows
pub fn checked_mean(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    checked_sum(values)?.checked_div(Decimal::from(values.len()))
}

/// Parse operator-entered numeric text; blank or malformed input yields `None`
pub fn parse_decimal(text: &str) -> Option<Decimal> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .parse::<Decimal>()
        .ok()
        .or_else(|| Decimal::from_scientific(trimmed).ok())
}

/// Parse an ISO `YYYY-MM-DD` date; anything else yields `None`
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
}

/// Serde helpers that never fail on malformed operator input.
///
/// Form fields arrive as numbers, numeric strings, blanks or junk. A value
/// that cannot be read becomes `None` instead of rejecting the whole
/// submission.
pub mod lenient {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use serde::{de::IgnoredAny, Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawValue {
        Number(serde_json::Number),
        Text(String),
        Other(IgnoredAny),
    }

    pub fn decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<RawValue> = Option::deserialize(deserializer)?;
        Ok(match raw {
            Some(RawValue::Number(n)) => super::parse_decimal(&n.to_string()),
            Some(RawValue::Text(s)) => super::parse_decimal(&s),
            Some(RawValue::Other(_)) | None => None,
        })
    }

    pub fn date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<RawValue> = Option::deserialize(deserializer)?;
        Ok(match raw {
            Some(RawValue::Text(s)) => super::parse_date(&s),
            _ => None,
        })
    }

    /// Trimmed text; blank becomes `None`
    pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<RawValue> = Option::deserialize(deserializer)?;
        Ok(match raw {
            Some(RawValue::Text(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Some(RawValue::Number(n)) => Some(n.to_string()),
            _ => None,
        })
    }
}
