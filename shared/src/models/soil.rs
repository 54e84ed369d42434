//! Soil-moisture inputs

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::DEFAULT_STARTING_BALANCE_MM;

/// Operator-entered soil inputs for one plot and day
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ManualSoilEntry {
    /// Effective rain override (mm)
    pub effective_rain: Option<Decimal>,
    /// Irrigation applied (mm)
    pub irrigation: Option<Decimal>,
}

/// Soil-moisture account of a plot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SoilMoistureState {
    /// Opening balance, also the total available moisture ceiling (mm)
    pub starting_balance: Decimal,
    pub entries: BTreeMap<NaiveDate, ManualSoilEntry>,
}

impl SoilMoistureState {
    /// Total available moisture
    pub fn tam(&self) -> Decimal {
        self.starting_balance
    }
}

impl Default for SoilMoistureState {
    fn default() -> Self {
        Self {
            starting_balance: DEFAULT_STARTING_BALANCE_MM,
            entries: BTreeMap::new(),
        }
    }
}
