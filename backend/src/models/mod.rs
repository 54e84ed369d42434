//! Database models for the Estate Irrigation Monitor
//!
//! Re-exports models from the shared crate and adds the row types read back
//! from PostgreSQL.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

pub use shared::models::*;
use shared::types::DateRange;

fn stored_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Option<DateRange> {
    match (start, end) {
        (Some(start), Some(end)) => Some(DateRange::new(start, end)),
        _ => None,
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct PlotMetadataRow {
    pub reference_date: Option<NaiveDate>,
    pub kc: Option<Decimal>,
    pub variety: Option<String>,
}

impl From<PlotMetadataRow> for PlotMetadata {
    fn from(row: PlotMetadataRow) -> Self {
        PlotMetadata {
            reference_date: row.reference_date,
            kc: row.kc,
            variety: row.variety,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct ScheduleRowRecord {
    pub label: String,
    pub range_start: Option<NaiveDate>,
    pub range_end: Option<NaiveDate>,
    pub scheduled_mm: Option<Decimal>,
    pub actual_mm: Option<Decimal>,
    pub effective_rain_mm: Option<Decimal>,
    pub percent: Option<Decimal>,
    pub comment: String,
}

impl From<ScheduleRowRecord> for WeeklyScheduleRow {
    fn from(row: ScheduleRowRecord) -> Self {
        WeeklyScheduleRow {
            label: row.label,
            range: stored_range(row.range_start, row.range_end),
            scheduled: row.scheduled_mm,
            actual: row.actual_mm,
            effective_rain: row.effective_rain_mm,
            percent: row.percent,
            comment: row.comment,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct AgronomyRowRecord {
    pub label: String,
    pub range_start: Option<NaiveDate>,
    pub range_end: Option<NaiveDate>,
    pub gain_cm: Option<Decimal>,
    pub cumulative_cm: Option<Decimal>,
    pub fertigation: String,
    pub chemigation: String,
}

impl From<AgronomyRowRecord> for AgronomyWeekRow {
    fn from(row: AgronomyRowRecord) -> Self {
        AgronomyWeekRow {
            label: row.label,
            range: stored_range(row.range_start, row.range_end),
            gain: row.gain_cm,
            cumulative: row.cumulative_cm,
            fertigation: row.fertigation,
            chemigation: row.chemigation,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct SoilEntryRow {
    pub entry_date: NaiveDate,
    pub effective_rain_mm: Option<Decimal>,
    pub irrigation_mm: Option<Decimal>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct WeatherRow {
    pub record_date: NaiveDate,
    pub tmax: Option<Decimal>,
    pub tmin: Option<Decimal>,
    pub rainfall_mm: Option<Decimal>,
    pub et0_mm: Option<Decimal>,
}

impl From<WeatherRow> for DailyWeatherRecord {
    fn from(row: WeatherRow) -> Self {
        DailyWeatherRecord {
            date: row.record_date,
            tmax: row.tmax,
            tmin: row.tmin,
            rainfall: row.rainfall_mm,
            et0: row.et0_mm,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct NdviRow {
    pub id: Uuid,
    pub observed_on: NaiveDate,
    pub plot_id: i16,
    pub ndvi: Decimal,
    pub biomass: Option<Decimal>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct PestRow {
    pub id: Uuid,
    pub observed_on: NaiveDate,
    pub plot_id: i16,
    pub pest: String,
    pub severity: String,
    pub area_ha: Option<Decimal>,
    pub action: String,
}

/// Plot ids are stored as SMALLINT
pub fn plot_id_from_db(value: i16) -> Option<PlotId> {
    u16::try_from(value).ok().map(PlotId)
}

pub fn plot_id_to_db(id: PlotId) -> i16 {
    i16::try_from(id.0).unwrap_or(i16::MAX)
}

impl NdviRow {
    pub fn into_record(self) -> Option<NdviRecord> {
        Some(NdviRecord {
            id: self.id,
            date: self.observed_on,
            plot_id: plot_id_from_db(self.plot_id)?,
            ndvi: self.ndvi,
            biomass: self.biomass,
        })
    }
}

impl PestRow {
    pub fn into_record(self) -> Option<PestRecord> {
        Some(PestRecord {
            id: self.id,
            date: self.observed_on,
            plot_id: plot_id_from_db(self.plot_id)?,
            pest: self.pest,
            severity: PestSeverity::parse(&self.severity),
            area: self.area_ha,
            action: self.action,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_range_is_dropped() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1);
        assert!(stored_range(start, None).is_none());
        assert!(stored_range(start, NaiveDate::from_ymd_opt(2024, 1, 7)).is_some());
    }

    #[test]
    fn test_plot_id_conversion() {
        assert_eq!(plot_id_from_db(7), Some(PlotId(7)));
        assert_eq!(plot_id_from_db(-1), None);
        assert_eq!(plot_id_to_db(PlotId(41)), 41);
    }
}
