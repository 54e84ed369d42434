//! Validation utilities for the estate irrigation monitor
//!
//! Operator input is validated leniently: malformed numbers become missing
//! values upstream, so these checks only reject values that are readable but
//! physically meaningless.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{PlotId, PlotRegistry};

/// A readable but meaningless input value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Water depth cannot be negative")]
    NegativeDepth,

    #[error("Water depth cannot exceed 10000 mm")]
    DepthTooLarge,

    #[error("Starting balance must be greater than zero")]
    NonPositiveBalance,

    #[error("NDVI must be between -1 and 1")]
    NdviOutOfRange,

    #[error("Affected area cannot be negative")]
    NegativeArea,

    #[error("Unknown plot")]
    UnknownPlot,
}

impl InputError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            InputError::NegativeDepth => "negative_depth",
            InputError::DepthTooLarge => "depth_too_large",
            InputError::NonPositiveBalance => "starting_balance",
            InputError::NdviOutOfRange => "ndvi_range",
            InputError::NegativeArea => "negative_area",
            InputError::UnknownPlot => "unknown_plot",
        }
    }
}

// ============================================================================
// Depth and Balance Validations
// ============================================================================

/// Upper bound for any single water depth (mm)
pub const MAX_DEPTH_MM: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);

/// Water depths (scheduled, applied, rain, ET0) lie in `[0, MAX_DEPTH_MM]`
pub fn validate_depth_mm(depth: Decimal) -> Result<(), InputError> {
    if depth < Decimal::ZERO {
        return Err(InputError::NegativeDepth);
    }
    if depth > MAX_DEPTH_MM {
        return Err(InputError::DepthTooLarge);
    }
    Ok(())
}

/// Starting balance must be positive; it is also the moisture ceiling
pub fn validate_starting_balance(balance: Decimal) -> Result<(), InputError> {
    if balance <= Decimal::ZERO {
        return Err(InputError::NonPositiveBalance);
    }
    Ok(())
}

// ============================================================================
// Observation Validations
// ============================================================================

/// NDVI is a normalised index in [-1, 1]
pub fn validate_ndvi(ndvi: Decimal) -> Result<(), InputError> {
    if ndvi < Decimal::NEGATIVE_ONE || ndvi > Decimal::ONE {
        return Err(InputError::NdviOutOfRange);
    }
    Ok(())
}

pub fn validate_area(area: Decimal) -> Result<(), InputError> {
    if area < Decimal::ZERO {
        return Err(InputError::NegativeArea);
    }
    Ok(())
}

/// Plot id must name a registered plot
pub fn validate_plot_id(registry: &PlotRegistry, id: PlotId) -> Result<(), InputError> {
    if !registry.contains(id) {
        return Err(InputError::UnknownPlot);
    }
    Ok(())
}

/// Adapters for `#[validate(custom = "...")]` on request types
pub mod rules {
    use rust_decimal::Decimal;
    use validator::ValidationError;

    use super::InputError;

    fn wrap(result: Result<(), InputError>) -> Result<(), ValidationError> {
        result.map_err(|error| {
            let mut validation = ValidationError::new(error.code());
            validation.message = Some(error.to_string().into());
            validation
        })
    }

    pub fn ndvi(value: &Decimal) -> Result<(), ValidationError> {
        wrap(super::validate_ndvi(*value))
    }

    pub fn depth(value: &Decimal) -> Result<(), ValidationError> {
        wrap(super::validate_depth_mm(*value))
    }

    pub fn area(value: &Decimal) -> Result<(), ValidationError> {
        wrap(super::validate_area(*value))
    }
}
