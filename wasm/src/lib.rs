//! WebAssembly module for the Estate Irrigation Monitor
//!
//! Provides client-side computation for:
//! - Weekly compliance percent and colour
//! - Soil reserve banding
//! - Week index resolution for the schedule editor
//! - Balance table preview before a soil submission is saved

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use shared::balance::{balance_table, BalanceParams};
use shared::calendar;
use shared::compliance;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;
pub use shared::validation::*;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    web_sys::console::log_1(&JsValue::from_str("irrigation monitor wasm ready"));
}

fn to_decimal(value: f64) -> Decimal {
    Decimal::try_from(value).unwrap_or(Decimal::ZERO)
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

/// Delivered water as a percentage of the schedule; `undefined` without a schedule
#[wasm_bindgen]
pub fn compliance_percent(scheduled: f64, actual: f64, effective_rain: f64) -> Option<f64> {
    compliance::compliance_percent(
        to_decimal(scheduled),
        to_decimal(actual),
        to_decimal(effective_rain),
    )
    .map(to_f64)
}

/// Chart colour for a weekly compliance percent
#[wasm_bindgen]
pub fn compliance_color(percent: Option<f64>) -> String {
    compliance::compliance_band(percent.map(to_decimal))
        .color()
        .to_string()
}

#[derive(Serialize)]
struct SoilBandView {
    percent: f64,
    band: compliance::SoilBand,
    color: &'static str,
}

/// Soil reserve as `{percent, band, color}` JSON
#[wasm_bindgen]
pub fn soil_band(balance: Option<f64>, tam: Option<f64>) -> Result<String, JsValue> {
    let (percent, band) = compliance::soil_band(balance.map(to_decimal), tam.map(to_decimal));
    let view = SoilBandView {
        percent: to_f64(percent.round_dp(1)),
        band,
        color: band.color(),
    };
    serde_json::to_string(&view).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Zero-based week index of `query` from the reference date (both `YYYY-MM-DD`)
#[wasm_bindgen]
pub fn resolve_week_index(reference: &str, query: &str) -> Option<i32> {
    let query = parse_date(query)?;
    calendar::resolve_week_index(parse_date(reference), query).and_then(|i| i32::try_from(i).ok())
}

/// Week index of the browser's current date
#[wasm_bindgen]
pub fn current_week_index(reference: &str) -> Option<i32> {
    let now = js_sys::Date::new_0();
    let today = NaiveDate::from_ymd_opt(
        now.get_full_year() as i32,
        now.get_month() + 1,
        now.get_date(),
    )?;
    calendar::resolve_week_index(parse_date(reference), today).and_then(|i| i32::try_from(i).ok())
}

/// Whether an NDVI reading is within range
#[wasm_bindgen]
pub fn is_valid_ndvi(ndvi: f64) -> bool {
    validate_ndvi(to_decimal(ndvi)).is_ok()
}

/// Input for a balance preview
#[derive(Deserialize)]
struct BalancePreviewInput {
    starting_balance: Option<Decimal>,
    kc: Option<Decimal>,
    weather: Vec<DailyWeatherRecord>,
    #[serde(default)]
    entries: BTreeMap<NaiveDate, ManualSoilEntry>,
}

/// Daily balance table for the submitted inputs, as JSON
#[wasm_bindgen]
pub fn preview_balance_table(input_json: &str) -> Result<String, JsValue> {
    let input: BalancePreviewInput = serde_json::from_str(input_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid balance input JSON: {}", e)))?;

    let params = BalanceParams::new(input.starting_balance, input.kc);
    let weather = normalize_weather(input.weather);
    let table = balance_table(params, &weather, &input.entries);
    serde_json::to_string(&table).map_err(|e| JsValue::from_str(&e.to_string()))
}
