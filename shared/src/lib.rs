//! Shared types and engine for the Estate Irrigation Monitor
//!
//! Contains the models, the week calendar, the soil-moisture accumulator,
//! compliance banding and the dashboard aggregations. Everything here is
//! pure and is used by both the backend and the WASM bindings.

pub mod aggregation;
pub mod balance;
pub mod calendar;
pub mod compliance;
pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
