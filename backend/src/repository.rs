//! Cached snapshot over the record store
//!
//! All reads are served from an in-memory [`FarmSnapshot`] behind an async
//! read/write lock. Writes update the snapshot and persist while holding the
//! write lock; a failed save is logged and the in-memory state is kept, so
//! the dashboard stays usable while the store is down.

use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::{RwLock, RwLockReadGuard};

use crate::error::{AppError, AppResult};
use crate::models::{
    DailyWeatherRecord, FarmSnapshot, NdviRecord, PestRecord, PlotId, PlotRecords,
    PlotRegistry, WeekTable,
};
use crate::store::RecordStore;

#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn RecordStore>,
    registry: PlotRegistry,
    default_balance: Decimal,
    snapshot: Arc<RwLock<FarmSnapshot>>,
}

impl Repository {
    /// Build the first snapshot from the store
    pub async fn load(
        store: Arc<dyn RecordStore>,
        registry: PlotRegistry,
        default_balance: Decimal,
    ) -> AppResult<Self> {
        let snapshot = build_snapshot(store.as_ref(), &registry, default_balance).await?;
        tracing::info!(
            backend = store.backend(),
            plots = registry.len(),
            weather_days = snapshot.weather().len(),
            "Snapshot loaded"
        );
        Ok(Self {
            store,
            registry,
            default_balance,
            snapshot: Arc::new(RwLock::new(snapshot)),
        })
    }

    /// Rebuild the snapshot from the store, replacing the cached copy
    pub async fn reload(&self) -> AppResult<()> {
        let mut snapshot = self.snapshot.write().await;
        *snapshot = build_snapshot(self.store.as_ref(), &self.registry, self.default_balance).await?;
        tracing::info!(backend = self.store.backend(), "Snapshot reloaded");
        Ok(())
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, FarmSnapshot> {
        self.snapshot.read().await
    }

    pub fn registry(&self) -> &PlotRegistry {
        &self.registry
    }

    pub fn default_balance(&self) -> Decimal {
        self.default_balance
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    pub async fn ping(&self) -> bool {
        self.store.ping().await
    }

    fn ensure_plot(&self, plot: PlotId) -> AppResult<()> {
        if self.registry.contains(plot) {
            Ok(())
        } else {
            Err(AppError::plot_not_found(plot))
        }
    }

    /// Apply `change` to one plot's records and persist the result.
    ///
    /// The write lock is held from the read of the current records until the
    /// store has been written, so concurrent edits to the same plot cannot
    /// resurrect stale fields and saves reach the store in lock order.
    pub async fn update_plot<F>(&self, plot: PlotId, change: F) -> AppResult<PlotRecords>
    where
        F: FnOnce(PlotRecords) -> PlotRecords,
    {
        self.ensure_plot(plot)?;
        let mut snapshot = self.snapshot.write().await;
        let current = snapshot
            .plot(plot)
            .cloned()
            .ok_or_else(|| AppError::plot_not_found(plot))?;

        let mut records = change(current);
        records.apply_calendar();
        snapshot.replace_plot(plot, records.clone());

        let saved = async {
            self.store.save_plot_metadata(plot, &records.metadata).await?;
            self.store.save_weekly_rows(plot, records.schedule.rows()).await?;
            self.store.save_agronomy_rows(plot, records.agronomy.rows()).await?;
            self.store.save_soil_state(plot, &records.soil).await
        }
        .await;
        log_persist_failure("plot records", saved);
        Ok(records)
    }

    /// Replace every record of a plot
    pub async fn replace_plot(&self, plot: PlotId, records: PlotRecords) -> AppResult<()> {
        self.update_plot(plot, |_| records).await.map(|_| ())
    }

    /// Add or overwrite a single day of weather
    pub async fn upsert_weather(&self, record: DailyWeatherRecord) -> AppResult<()> {
        let mut snapshot = self.snapshot.write().await;
        let mut records = snapshot.weather().to_vec();
        records.push(record);
        snapshot.set_weather(records);

        let saved = self.store.save_daily_weather(snapshot.weather()).await;
        log_persist_failure("daily weather", saved);
        Ok(())
    }

    pub async fn replace_weather(&self, records: Vec<DailyWeatherRecord>) -> AppResult<()> {
        let mut snapshot = self.snapshot.write().await;
        snapshot.set_weather(records);

        let saved = self.store.save_daily_weather(snapshot.weather()).await;
        log_persist_failure("daily weather", saved);
        Ok(())
    }

    pub async fn append_ndvi(&self, record: NdviRecord) -> AppResult<()> {
        self.ensure_plot(record.plot_id)?;
        let mut snapshot = self.snapshot.write().await;
        let mut records = snapshot.ndvi().to_vec();
        records.push(record.clone());
        snapshot.set_ndvi(records);

        let saved = self.store.append_ndvi_record(&record).await;
        log_persist_failure("NDVI record", saved);
        Ok(())
    }

    pub async fn append_pest(&self, record: PestRecord) -> AppResult<()> {
        self.ensure_plot(record.plot_id)?;
        let mut snapshot = self.snapshot.write().await;
        let mut records = snapshot.pests().to_vec();
        records.push(record.clone());
        snapshot.set_pests(records);

        let saved = self.store.append_pest_record(&record).await;
        log_persist_failure("pest record", saved);
        Ok(())
    }

    pub async fn replace_pests(&self, records: Vec<PestRecord>) -> AppResult<()> {
        let mut snapshot = self.snapshot.write().await;
        snapshot.set_pests(records);

        let saved = self.store.save_pest_records(snapshot.pests()).await;
        log_persist_failure("pest records", saved);
        Ok(())
    }
}

fn log_persist_failure(what: &str, result: AppResult<()>) {
    if let Err(error) = result {
        tracing::error!(error = %error, "Failed to persist {}; keeping in-memory copy", what);
    }
}

async fn build_snapshot(
    store: &dyn RecordStore,
    registry: &PlotRegistry,
    default_balance: Decimal,
) -> AppResult<FarmSnapshot> {
    let mut snapshot = FarmSnapshot::new(registry.clone());

    for plot in registry.ids() {
        let mut records = PlotRecords {
            metadata: store.get_plot_metadata(plot).await?.unwrap_or_default(),
            schedule: WeekTable::from_rows(store.get_weekly_rows(plot).await?),
            agronomy: WeekTable::from_rows(store.get_agronomy_rows(plot).await?),
            soil: store.get_soil_state(plot, default_balance).await?,
        };
        records.apply_calendar();
        snapshot.replace_plot(plot, records);
    }

    snapshot.set_weather(store.get_daily_weather().await?);
    snapshot.set_ndvi(store.get_ndvi_records().await?);
    snapshot.set_pests(store.get_pest_records().await?);
    Ok(snapshot)
}
