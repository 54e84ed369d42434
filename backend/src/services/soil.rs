//! Soil-moisture balance service

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use shared::aggregation::{self, SoilStatus};
use shared::balance::{balance_table, BalanceDay, BalanceParams};
use shared::compliance::SoilBand;

use crate::error::{AppError, AppResult};
use crate::models::{DailyWeatherRecord, PlotId, PlotRecords};
use crate::repository::Repository;

/// Rows shown in the soil table
pub const SOIL_TABLE_DAYS: usize = 7;

/// Soil position and recent daily table for one plot.
///
/// `balance` is the whole-history figure shared with the estate soil
/// snapshot. `table` is walked from `table_start` only, with daily rounding,
/// so its last row can differ from `balance` when weather predates the
/// reference date.
#[derive(Debug, Serialize)]
pub struct SoilView {
    pub starting_balance: Decimal,
    pub tam: Decimal,
    pub balance: Decimal,
    pub table_start: Option<NaiveDate>,
    pub percent: Decimal,
    pub band: SoilBand,
    pub color: String,
    pub table: Vec<BalanceDay>,
}

/// Soil-moisture service over the cached snapshot
#[derive(Clone)]
pub struct SoilService {
    repo: Repository,
}

impl SoilService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Soil position of every plot
    pub async fn snapshot(&self, today: NaiveDate) -> Vec<SoilStatus> {
        let snapshot = self.repo.read().await;
        aggregation::soil_snapshot(&snapshot, today)
    }

    /// Soil view of one plot
    pub async fn plot_view(&self, plot: PlotId, today: NaiveDate) -> AppResult<SoilView> {
        let snapshot = self.repo.read().await;
        let name = snapshot
            .registry()
            .name(plot)
            .ok_or_else(|| AppError::plot_not_found(plot))?;
        let records = snapshot
            .plot(plot)
            .ok_or_else(|| AppError::plot_not_found(plot))?;
        Ok(soil_view(plot, name, records, snapshot.weather(), today))
    }
}

/// First day of the soil table: the reference date, else the first weather day
pub fn table_start(records: &PlotRecords, weather: &[DailyWeatherRecord]) -> Option<NaiveDate> {
    records
        .metadata
        .reference_date
        .or_else(|| weather.first().map(|r| r.date))
}

/// Daily table from [`table_start`] to `today`, keeping the last seven rows
pub fn recent_balance_table(
    records: &PlotRecords,
    weather: &[DailyWeatherRecord],
    today: NaiveDate,
) -> Vec<BalanceDay> {
    let Some(start) = table_start(records, weather) else {
        return Vec::new();
    };

    let series: Vec<DailyWeatherRecord> = weather
        .iter()
        .filter(|r| r.date >= start && r.date <= today)
        .cloned()
        .collect();

    let params = BalanceParams::new(Some(records.soil.starting_balance), records.metadata.kc);
    let mut table = balance_table(params, &series, &records.soil.entries);
    let skip = table.len().saturating_sub(SOIL_TABLE_DAYS);
    table.drain(..skip);
    table
}

pub fn soil_view(
    plot: PlotId,
    name: &str,
    records: &PlotRecords,
    weather: &[DailyWeatherRecord],
    today: NaiveDate,
) -> SoilView {
    let status = aggregation::soil_status(plot, name, records, weather, today);
    SoilView {
        starting_balance: records.soil.starting_balance,
        tam: status.tam,
        balance: status.balance,
        table_start: table_start(records, weather),
        percent: status.percent,
        band: status.band,
        color: status.color,
        table: recent_balance_table(records, weather, today),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    fn weather(days: std::ops::RangeInclusive<u32>) -> Vec<DailyWeatherRecord> {
        days.map(|day| DailyWeatherRecord {
            et0: Some(Decimal::from(2)),
            ..DailyWeatherRecord::new(d(day))
        })
        .collect()
    }

    #[test]
    fn test_table_keeps_last_seven_days() {
        let records = PlotRecords::default();
        let table = recent_balance_table(&records, &weather(1..=20), d(12));
        assert_eq!(table.len(), 7);
        assert_eq!(table[0].date, d(6));
        assert_eq!(table[6].date, d(12));
        // Twelve days at 2 mm from 120
        assert_eq!(table[6].balance, Decimal::from(96));
    }

    #[test]
    fn test_table_starts_at_reference_date() {
        let mut records = PlotRecords::default();
        records.metadata.reference_date = Some(d(10));
        let table = recent_balance_table(&records, &weather(1..=20), d(12));
        assert_eq!(table.len(), 3);
        assert_eq!(table[0].balance, Decimal::from(118));
    }

    #[test]
    fn test_headline_balance_covers_weather_before_the_table() {
        let mut records = PlotRecords::default();
        records.metadata.reference_date = Some(d(10));
        let view = soil_view(PlotId(1), "North", &records, &weather(1..=20), d(12));

        assert_eq!(view.table_start, Some(d(10)));
        assert_eq!(view.table.last().map(|r| r.balance), Some(Decimal::from(114)));
        // Twelve days of history, not just the three in the table
        assert_eq!(view.balance, Decimal::from(96));

        let records = PlotRecords::default();
        let view = soil_view(PlotId(1), "North", &records, &weather(1..=20), d(12));
        assert_eq!(view.table_start, Some(d(1)));
        assert_eq!(view.table.last().map(|r| r.balance), Some(view.balance));
    }

    #[test]
    fn test_table_without_weather_is_empty() {
        let records = PlotRecords::default();
        assert!(recent_balance_table(&records, &[], d(12)).is_empty());
    }
}
