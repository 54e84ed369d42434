//! Record store abstraction
//!
//! The repository reads every record through [`RecordStore`] when it builds a
//! snapshot and writes through it on every edit. Saves replace the whole
//! record set for a plot (or the whole weather/pest list), never patch it.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::AppResult;
use crate::models::{
    AgronomyWeekRow, DailyWeatherRecord, ManualSoilEntry, NdviRecord, PestRecord, PlotId,
    PlotMetadata, SoilMoistureState, WeeklyScheduleRow,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryRecordStore;
pub use postgres::PgRecordStore;

#[axum::async_trait]
pub trait RecordStore: Send + Sync {
    /// Short backend name for health reporting
    fn backend(&self) -> &'static str;

    /// Whether the backing store is reachable
    async fn ping(&self) -> bool {
        true
    }

    async fn get_plot_metadata(&self, plot: PlotId) -> AppResult<Option<PlotMetadata>>;

    /// Stored schedule rows in week order; may hold fewer than 52
    async fn get_weekly_rows(&self, plot: PlotId) -> AppResult<Vec<WeeklyScheduleRow>>;

    async fn get_agronomy_rows(&self, plot: PlotId) -> AppResult<Vec<AgronomyWeekRow>>;

    async fn get_starting_balance(&self, plot: PlotId) -> AppResult<Option<Decimal>>;

    async fn get_manual_soil_entries(
        &self,
        plot: PlotId,
    ) -> AppResult<BTreeMap<NaiveDate, ManualSoilEntry>>;

    async fn get_daily_weather(&self) -> AppResult<Vec<DailyWeatherRecord>>;

    async fn get_ndvi_records(&self) -> AppResult<Vec<NdviRecord>>;

    async fn get_pest_records(&self) -> AppResult<Vec<PestRecord>>;

    /// Starting balance and manual entries together
    async fn get_soil_state(
        &self,
        plot: PlotId,
        default_balance: Decimal,
    ) -> AppResult<SoilMoistureState> {
        let starting_balance = self
            .get_starting_balance(plot)
            .await?
            .unwrap_or(default_balance);
        let entries = self.get_manual_soil_entries(plot).await?;
        Ok(SoilMoistureState {
            starting_balance,
            entries,
        })
    }

    async fn save_plot_metadata(&self, plot: PlotId, metadata: &PlotMetadata) -> AppResult<()>;

    async fn save_weekly_rows(&self, plot: PlotId, rows: &[WeeklyScheduleRow]) -> AppResult<()>;

    async fn save_agronomy_rows(&self, plot: PlotId, rows: &[AgronomyWeekRow]) -> AppResult<()>;

    /// Replace the starting balance and every manual entry of a plot
    async fn save_soil_state(&self, plot: PlotId, state: &SoilMoistureState) -> AppResult<()>;

    async fn save_daily_weather(&self, records: &[DailyWeatherRecord]) -> AppResult<()>;

    async fn append_ndvi_record(&self, record: &NdviRecord) -> AppResult<()>;

    async fn append_pest_record(&self, record: &PestRecord) -> AppResult<()>;

    async fn save_pest_records(&self, records: &[PestRecord]) -> AppResult<()>;
}
