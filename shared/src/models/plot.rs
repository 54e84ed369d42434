//! Estate plot models

use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Plot identity, 1-based position in the estate registry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct PlotId(pub u16);

impl PlotId {
    pub fn index(&self) -> usize {
        usize::from(self.0).saturating_sub(1)
    }
}

impl std::fmt::Display for PlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fixed, ordered registry of plot names
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlotRegistry {
    names: Vec<String>,
}

impl PlotRegistry {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// The estate layout: Block 1–21, A1–A3, B1–B3, Mac 1–14
    pub fn estate() -> Self {
        let names = (1..=21)
            .map(|i| format!("Block {}", i))
            .chain((1..=3).map(|i| format!("A{}", i)))
            .chain((1..=3).map(|i| format!("B{}", i)))
            .chain((1..=14).map(|i| format!("Mac {}", i)))
            .collect();
        Self { names }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, id: PlotId) -> bool {
        id.0 >= 1 && usize::from(id.0) <= self.names.len()
    }

    pub fn name(&self, id: PlotId) -> Option<&str> {
        if !self.contains(id) {
            return None;
        }
        self.names.get(id.index()).map(String::as_str)
    }

    /// All ids in registry order
    pub fn ids(&self) -> impl Iterator<Item = PlotId> + '_ {
        (1..=self.names.len()).map(|i| PlotId(i as u16))
    }

    pub fn entries(&self) -> impl Iterator<Item = (PlotId, &str)> + '_ {
        self.names
            .iter()
            .enumerate()
            .map(|(i, name)| (PlotId(i as u16 + 1), name.as_str()))
    }
}

impl Default for PlotRegistry {
    fn default() -> Self {
        Self::estate()
    }
}

/// Operator-maintained plot metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PlotMetadata {
    /// Cut or planting date; week 1 starts on the Monday of this week
    pub reference_date: Option<NaiveDate>,
    /// Crop coefficient
    pub kc: Option<Decimal>,
    pub variety: Option<String>,
}

impl PlotMetadata {
    /// Kc used for ETc; missing or non-positive values fall back to 1.0
    pub fn effective_kc(&self) -> Decimal {
        effective_kc(self.kc)
    }

    /// Monday of the reference date's week
    pub fn first_monday(&self) -> Option<NaiveDate> {
        self.reference_date.map(monday_of)
    }

    /// Plot age as (days, months); months are days / 30 at one decimal
    pub fn age(&self, today: NaiveDate) -> Option<(i64, Decimal)> {
        let reference = self.reference_date?;
        let days = (today - reference).num_days();
        let months = (Decimal::from(days) / Decimal::from(30)).round_dp(1);
        Some((days, months))
    }
}

pub fn effective_kc(kc: Option<Decimal>) -> Decimal {
    match kc {
        Some(value) if value > Decimal::ZERO => value,
        _ => Decimal::ONE,
    }
}

pub(crate) fn monday_of(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}
