//! Field observations: vegetation index and pest scouting

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::plot::PlotId;

/// Biomass estimate per unit of NDVI
pub const BIOMASS_PER_NDVI: Decimal = Decimal::from_parts(150, 0, 0, false, 0);

/// NDVI reading for a plot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NdviRecord {
    pub id: Uuid,
    pub date: NaiveDate,
    pub plot_id: PlotId,
    pub ndvi: Decimal,
    pub biomass: Option<Decimal>,
}

impl NdviRecord {
    /// New reading with biomass estimated from NDVI
    pub fn new(date: NaiveDate, plot_id: PlotId, ndvi: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            plot_id,
            ndvi,
            biomass: Some(ndvi * BIOMASS_PER_NDVI),
        }
    }
}

/// Scouting severity
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum PestSeverity {
    #[default]
    Low,
    Medium,
    High,
}

impl PestSeverity {
    /// Lenient parse; unknown text reads as `Low`
    pub fn parse(text: &str) -> Self {
        match text.trim().to_lowercase().as_str() {
            "medium" | "moderate" => PestSeverity::Medium,
            "high" | "severe" => PestSeverity::High,
            _ => PestSeverity::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PestSeverity::Low => "Low",
            PestSeverity::Medium => "Medium",
            PestSeverity::High => "High",
        }
    }
}

impl std::fmt::Display for PestSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Pest or disease observation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PestRecord {
    pub id: Uuid,
    pub date: NaiveDate,
    pub plot_id: PlotId,
    pub pest: String,
    pub severity: PestSeverity,
    /// Affected area (ha)
    pub area: Option<Decimal>,
    pub action: String,
}
