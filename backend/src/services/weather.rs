//! Weather service for daily estate records, monthly statistics and export

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::types::lenient;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{monthly_stats, DailyWeatherRecord, MonthlyWeatherStats};
use crate::repository::Repository;

/// Weather service over the cached snapshot
#[derive(Clone)]
pub struct WeatherService {
    repo: Repository,
}

/// Submitted weather day
#[derive(Debug, Default, Deserialize, Validate)]
pub struct WeatherInput {
    #[serde(default, deserialize_with = "lenient::date")]
    pub date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub tmax: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub tmin: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    #[validate(custom = "shared::validation::rules::depth")]
    pub rainfall: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    #[validate(custom = "shared::validation::rules::depth")]
    pub et0: Option<Decimal>,
}

impl WeatherInput {
    /// Record for this input; `None` without a valid date
    pub fn into_record(self) -> Option<DailyWeatherRecord> {
        Some(DailyWeatherRecord {
            date: self.date?,
            tmax: self.tmax,
            tmin: self.tmin,
            rainfall: self.rainfall,
            et0: self.et0,
        })
    }
}

/// Weather page payload
#[derive(Debug, Serialize)]
pub struct WeatherOverview {
    pub records: Vec<DailyWeatherRecord>,
    pub monthly: Vec<MonthlyWeatherStats>,
}

/// CSV row layout for downloads
#[derive(Debug, Serialize)]
struct WeatherCsvRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Tmax")]
    tmax: Option<Decimal>,
    #[serde(rename = "Tmin")]
    tmin: Option<Decimal>,
    #[serde(rename = "Rain")]
    rainfall: Option<Decimal>,
    #[serde(rename = "ET0")]
    et0: Option<Decimal>,
}

impl From<&DailyWeatherRecord> for WeatherCsvRow {
    fn from(record: &DailyWeatherRecord) -> Self {
        Self {
            date: record.date.format("%Y-%m-%d").to_string(),
            tmax: record.tmax,
            tmin: record.tmin,
            rainfall: record.rainfall,
            et0: record.et0,
        }
    }
}

impl WeatherService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    pub async fn overview(&self) -> WeatherOverview {
        let snapshot = self.repo.read().await;
        WeatherOverview {
            records: snapshot.weather().to_vec(),
            monthly: monthly_stats(snapshot.weather()),
        }
    }

    /// Add or overwrite one day
    pub async fn add_record(&self, input: WeatherInput) -> AppResult<DailyWeatherRecord> {
        input.validate()?;
        let record = input
            .into_record()
            .ok_or_else(|| AppError::invalid("date", "A valid YYYY-MM-DD date is required"))?;
        self.repo.upsert_weather(record.clone()).await?;
        Ok(record)
    }

    /// Replace the whole series; rows without a valid date or with
    /// negative depths are dropped
    pub async fn replace_all(&self, inputs: Vec<WeatherInput>) -> AppResult<usize> {
        let records: Vec<DailyWeatherRecord> = inputs
            .into_iter()
            .filter(|input| input.validate().is_ok())
            .filter_map(WeatherInput::into_record)
            .collect();
        let submitted = records.len();
        self.repo.replace_weather(records).await?;
        tracing::info!(records = submitted, "Weather series replaced");
        Ok(submitted)
    }

    pub async fn export_csv(&self) -> AppResult<String> {
        let snapshot = self.repo.read().await;
        Self::export_to_csv(snapshot.weather())
    }

    /// Export records as CSV
    pub fn export_to_csv(records: &[DailyWeatherRecord]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for record in records {
            wtr.serialize(WeatherCsvRow::from(record))
                .map_err(|e| AppError::Export(format!("CSV serialization error: {}", e)))?;
        }
        let csv_data = String::from_utf8(
            wtr.into_inner()
                .map_err(|e| AppError::Export(format!("CSV writer error: {}", e)))?,
        )
        .map_err(|e| AppError::Export(format!("UTF-8 conversion error: {}", e)))?;
        Ok(csv_data)
    }
}
