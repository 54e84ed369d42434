//! In-process record store, used when no database is configured

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use super::RecordStore;
use crate::error::AppResult;
use crate::models::{
    AgronomyWeekRow, DailyWeatherRecord, ManualSoilEntry, NdviRecord, PestRecord, PlotId,
    PlotMetadata, SoilMoistureState, WeeklyScheduleRow,
};

#[derive(Default)]
struct Tables {
    metadata: HashMap<PlotId, PlotMetadata>,
    weekly: HashMap<PlotId, Vec<WeeklyScheduleRow>>,
    agronomy: HashMap<PlotId, Vec<AgronomyWeekRow>>,
    starting_balance: HashMap<PlotId, Decimal>,
    soil_entries: HashMap<PlotId, BTreeMap<NaiveDate, ManualSoilEntry>>,
    weather: Vec<DailyWeatherRecord>,
    ndvi: Vec<NdviRecord>,
    pests: Vec<PestRecord>,
}

/// Record store that lives for the lifetime of the process
#[derive(Default)]
pub struct MemoryRecordStore {
    tables: Mutex<Tables>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[axum::async_trait]
impl RecordStore for MemoryRecordStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn get_plot_metadata(&self, plot: PlotId) -> AppResult<Option<PlotMetadata>> {
        Ok(self.tables.lock().await.metadata.get(&plot).cloned())
    }

    async fn get_weekly_rows(&self, plot: PlotId) -> AppResult<Vec<WeeklyScheduleRow>> {
        Ok(self.tables.lock().await.weekly.get(&plot).cloned().unwrap_or_default())
    }

    async fn get_agronomy_rows(&self, plot: PlotId) -> AppResult<Vec<AgronomyWeekRow>> {
        Ok(self.tables.lock().await.agronomy.get(&plot).cloned().unwrap_or_default())
    }

    async fn get_starting_balance(&self, plot: PlotId) -> AppResult<Option<Decimal>> {
        Ok(self.tables.lock().await.starting_balance.get(&plot).copied())
    }

    async fn get_manual_soil_entries(
        &self,
        plot: PlotId,
    ) -> AppResult<BTreeMap<NaiveDate, ManualSoilEntry>> {
        Ok(self
            .tables
            .lock()
            .await
            .soil_entries
            .get(&plot)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_daily_weather(&self) -> AppResult<Vec<DailyWeatherRecord>> {
        Ok(self.tables.lock().await.weather.clone())
    }

    async fn get_ndvi_records(&self) -> AppResult<Vec<NdviRecord>> {
        Ok(self.tables.lock().await.ndvi.clone())
    }

    async fn get_pest_records(&self) -> AppResult<Vec<PestRecord>> {
        Ok(self.tables.lock().await.pests.clone())
    }

    async fn save_plot_metadata(&self, plot: PlotId, metadata: &PlotMetadata) -> AppResult<()> {
        self.tables.lock().await.metadata.insert(plot, metadata.clone());
        Ok(())
    }

    async fn save_weekly_rows(&self, plot: PlotId, rows: &[WeeklyScheduleRow]) -> AppResult<()> {
        self.tables.lock().await.weekly.insert(plot, rows.to_vec());
        Ok(())
    }

    async fn save_agronomy_rows(&self, plot: PlotId, rows: &[AgronomyWeekRow]) -> AppResult<()> {
        self.tables.lock().await.agronomy.insert(plot, rows.to_vec());
        Ok(())
    }

    async fn save_soil_state(&self, plot: PlotId, state: &SoilMoistureState) -> AppResult<()> {
        let mut tables = self.tables.lock().await;
        tables.starting_balance.insert(plot, state.starting_balance);
        tables.soil_entries.insert(plot, state.entries.clone());
        Ok(())
    }

    async fn save_daily_weather(&self, records: &[DailyWeatherRecord]) -> AppResult<()> {
        self.tables.lock().await.weather = records.to_vec();
        Ok(())
    }

    async fn append_ndvi_record(&self, record: &NdviRecord) -> AppResult<()> {
        self.tables.lock().await.ndvi.push(record.clone());
        Ok(())
    }

    async fn append_pest_record(&self, record: &PestRecord) -> AppResult<()> {
        self.tables.lock().await.pests.push(record.clone());
        Ok(())
    }

    async fn save_pest_records(&self, records: &[PestRecord]) -> AppResult<()> {
        self.tables.lock().await.pests = records.to_vec();
        Ok(())
    }
}
