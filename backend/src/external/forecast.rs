//! 7-day forecast client
//!
//! Reads the yr.no location forecast JSON. The provider has shipped the day
//! list under both `days` and `dayIntervals`; both are accepted. Any failure
//! (network, status, body) degrades to an empty forecast.

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::config::ForecastConfig;
use crate::error::{AppError, AppResult};
use crate::models::{Forecast, ForecastDay, ForecastSymbol};
use shared::types::parse_decimal;

/// Days kept from the provider response
const FORECAST_DAYS: usize = 7;

/// Forecast API client
#[derive(Clone)]
pub struct ForecastClient {
    client: Client,
    url: String,
    enabled: bool,
}

impl ForecastClient {
    /// Create a new ForecastClient from configuration
    pub fn new(config: &ForecastConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: config.url(),
            enabled: config.enabled,
        })
    }

    /// Fetch and parse the forecast
    pub async fn fetch_forecast(&self) -> AppResult<Forecast> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| AppError::ForecastUnavailable(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::ForecastUnavailable(format!(
                "provider returned {}",
                response.status()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::ForecastUnavailable(format!("invalid JSON: {}", e)))?;

        Ok(parse_forecast(&body))
    }

    /// Forecast for display; failures are logged and yield no days
    pub async fn forecast_or_empty(&self) -> Forecast {
        if !self.enabled {
            return Forecast::default();
        }
        match self.fetch_forecast().await {
            Ok(forecast) => forecast,
            Err(error) => {
                tracing::warn!(error = %error, "Forecast fetch failed");
                Forecast::default()
            }
        }
    }
}

fn number(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_decimal(s),
        _ => None,
    }
}

/// First non-zero of `value`, `max`, `min`; zero if only zeros were given
fn pick_reading(block: Option<&Value>) -> Option<Decimal> {
    let block = block?.as_object()?;
    let readings: Vec<Decimal> = ["value", "max", "min"]
        .iter()
        .filter_map(|key| block.get(*key).and_then(number))
        .collect();
    readings
        .iter()
        .copied()
        .find(|v| !v.is_zero())
        .or_else(|| readings.first().copied())
        .map(|v| v.round_dp(1))
}

fn parse_day(day: &Value) -> ForecastDay {
    let raw_date = day
        .get("date")
        .or_else(|| day.get("time"))
        .and_then(Value::as_str)
        .unwrap_or_default();
    let iso_date: String = raw_date.chars().take(10).collect();
    let date = NaiveDate::parse_from_str(&iso_date, "%Y-%m-%d").ok();

    let symbol_code = day
        .get("symbol")
        .and_then(|s| s.get("code").or_else(|| s.get("id")))
        .and_then(Value::as_str)
        .filter(|code| !code.is_empty())
        .map(str::to_string);

    ForecastDay {
        date,
        iso_date,
        temperature_celsius: pick_reading(day.get("temperature")),
        rain_mm: pick_reading(day.get("precipitation")).unwrap_or_default(),
        symbol: ForecastSymbol::from_code(symbol_code.as_deref()),
        symbol_code,
    }
}

/// Parse the provider body into at most seven days
pub fn parse_forecast(body: &Value) -> Forecast {
    let days = ["days", "dayIntervals"]
        .iter()
        .filter_map(|key| body.get(*key))
        .find_map(Value::as_array)
        .map(|days| days.iter().take(FORECAST_DAYS).map(parse_day).collect())
        .unwrap_or_default();

    Forecast { days }
}
