//! Schedule compliance and severity banding
//!
//! Two independent band tables live here. Compliance bands are centred on
//! 100% and penalise both under- and over-watering; soil bands are a
//! one-sided depletion scale over total available moisture. They share
//! colours but not thresholds.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Display colours shared by the charts
pub mod colors {
    pub const GREY: &str = "#bdbdbd";
    pub const BLUE: &str = "#1565c0";
    pub const LIGHT_BLUE: &str = "#42a5f5";
    pub const GREEN: &str = "#2e7d32";
    pub const AMBER: &str = "#f9a825";
    pub const ORANGE: &str = "#fb8c00";
    pub const RED: &str = "#c62828";
}

fn dec(value: i64) -> Decimal {
    Decimal::from(value)
}

/// Delivered water as a percentage of the schedule, at one decimal.
///
/// `None` when nothing (or a non-positive amount) was scheduled: there is no
/// comparison to make, which is different from zero compliance. Also `None`
/// when the ratio is too large to represent.
pub fn compliance_percent(
    scheduled_sum: Decimal,
    actual_sum: Decimal,
    effective_rain_sum: Decimal,
) -> Option<Decimal> {
    if scheduled_sum <= Decimal::ZERO {
        return None;
    }
    let combined = actual_sum.checked_add(effective_rain_sum)?;
    let percent = combined.checked_div(scheduled_sum)?.checked_mul(dec(100))?;
    Some(percent.round_dp(1))
}

/// Weekly compliance band
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceBand {
    Missing,
    /// 90–110%
    OnTarget,
    /// 70–90% or 110–130%
    Acceptable,
    /// 50–70% or 130–150%
    Caution,
    /// Below 50% or above 150%
    Critical,
}

impl ComplianceBand {
    pub fn color(&self) -> &'static str {
        match self {
            ComplianceBand::Missing => colors::GREY,
            ComplianceBand::OnTarget => colors::BLUE,
            ComplianceBand::Acceptable => colors::GREEN,
            ComplianceBand::Caution => colors::AMBER,
            ComplianceBand::Critical => colors::RED,
        }
    }
}

/// Band a weekly compliance percent; first matching rule wins
pub fn compliance_band(percent: Option<Decimal>) -> ComplianceBand {
    let Some(p) = percent else {
        return ComplianceBand::Missing;
    };
    if p >= dec(90) && p <= dec(110) {
        return ComplianceBand::OnTarget;
    }
    if (p >= dec(70) && p < dec(90)) || (p > dec(110) && p <= dec(130)) {
        return ComplianceBand::Acceptable;
    }
    if p < dec(50) || p > dec(150) {
        return ComplianceBand::Critical;
    }
    ComplianceBand::Caution
}

/// Soil-moisture reserve band
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SoilBand {
    Missing,
    /// 95% of TAM and above
    Full,
    /// 90–95%
    NearFull,
    /// 70–90%
    Adequate,
    /// 50–70%
    Low,
    /// Below 50%
    Critical,
}

impl SoilBand {
    pub fn color(&self) -> &'static str {
        match self {
            SoilBand::Missing => colors::GREY,
            SoilBand::Full => colors::BLUE,
            SoilBand::NearFull => colors::LIGHT_BLUE,
            SoilBand::Adequate => colors::GREEN,
            SoilBand::Low => colors::ORANGE,
            SoilBand::Critical => colors::RED,
        }
    }
}

/// Balance as a percentage of TAM together with its band.
///
/// A missing balance, missing TAM or non-positive TAM gives `(0, Missing)`.
/// The percentage is not rounded.
pub fn soil_band(balance: Option<Decimal>, tam: Option<Decimal>) -> (Decimal, SoilBand) {
    let (Some(balance), Some(tam)) = (balance, tam) else {
        return (Decimal::ZERO, SoilBand::Missing);
    };
    if tam <= Decimal::ZERO {
        return (Decimal::ZERO, SoilBand::Missing);
    }

    let Some(pct) = balance.checked_div(tam).and_then(|ratio| ratio.checked_mul(dec(100))) else {
        return (Decimal::ZERO, SoilBand::Missing);
    };
    let band = if pct >= dec(95) {
        SoilBand::Full
    } else if pct >= dec(90) {
        SoilBand::NearFull
    } else if pct >= dec(70) {
        SoilBand::Adequate
    } else if pct >= dec(50) {
        SoilBand::Low
    } else {
        SoilBand::Critical
    };
    (pct, band)
}
