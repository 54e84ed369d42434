//! PostgreSQL record store

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;

use super::RecordStore;
use crate::error::AppResult;
use crate::models::{
    plot_id_to_db, AgronomyRowRecord, AgronomyWeekRow, DailyWeatherRecord, ManualSoilEntry,
    NdviRecord, NdviRow, PestRecord, PestRow, PlotId, PlotMetadata, PlotMetadataRow,
    ScheduleRowRecord, SoilEntryRow, SoilMoistureState, WeatherRow, WeeklyScheduleRow,
};

/// Record store backed by a sqlx connection pool
#[derive(Clone)]
pub struct PgRecordStore {
    db: PgPool,
}

impl PgRecordStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Apply the embedded migrations
    pub async fn migrate(&self) -> AppResult<()> {
        sqlx::migrate!("./migrations").run(&self.db).await?;
        Ok(())
    }
}

#[axum::async_trait]
impl RecordStore for PgRecordStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.db).await.is_ok()
    }

    async fn get_plot_metadata(&self, plot: PlotId) -> AppResult<Option<PlotMetadata>> {
        let row = sqlx::query_as::<_, PlotMetadataRow>(
            r#"
            SELECT reference_date, kc, variety
            FROM plot_metadata
            WHERE plot_id = $1
            "#,
        )
        .bind(plot_id_to_db(plot))
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(PlotMetadata::from))
    }

    async fn get_weekly_rows(&self, plot: PlotId) -> AppResult<Vec<WeeklyScheduleRow>> {
        let rows = sqlx::query_as::<_, ScheduleRowRecord>(
            r#"
            SELECT label, range_start, range_end, scheduled_mm, actual_mm,
                   effective_rain_mm, percent, comment
            FROM schedule_rows
            WHERE plot_id = $1
            ORDER BY week_index ASC
            "#,
        )
        .bind(plot_id_to_db(plot))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(WeeklyScheduleRow::from).collect())
    }

    async fn get_agronomy_rows(&self, plot: PlotId) -> AppResult<Vec<AgronomyWeekRow>> {
        let rows = sqlx::query_as::<_, AgronomyRowRecord>(
            r#"
            SELECT label, range_start, range_end, gain_cm, cumulative_cm,
                   fertigation, chemigation
            FROM agronomy_rows
            WHERE plot_id = $1
            ORDER BY week_index ASC
            "#,
        )
        .bind(plot_id_to_db(plot))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(AgronomyWeekRow::from).collect())
    }

    async fn get_starting_balance(&self, plot: PlotId) -> AppResult<Option<Decimal>> {
        let balance = sqlx::query_scalar::<_, Decimal>(
            "SELECT starting_balance_mm FROM soil_state WHERE plot_id = $1",
        )
        .bind(plot_id_to_db(plot))
        .fetch_optional(&self.db)
        .await?;

        Ok(balance)
    }

    async fn get_manual_soil_entries(
        &self,
        plot: PlotId,
    ) -> AppResult<BTreeMap<NaiveDate, ManualSoilEntry>> {
        let rows = sqlx::query_as::<_, SoilEntryRow>(
            r#"
            SELECT entry_date, effective_rain_mm, irrigation_mm
            FROM manual_soil_entries
            WHERE plot_id = $1
            "#,
        )
        .bind(plot_id_to_db(plot))
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                (
                    row.entry_date,
                    ManualSoilEntry {
                        effective_rain: row.effective_rain_mm,
                        irrigation: row.irrigation_mm,
                    },
                )
            })
            .collect())
    }

    async fn get_daily_weather(&self) -> AppResult<Vec<DailyWeatherRecord>> {
        let rows = sqlx::query_as::<_, WeatherRow>(
            r#"
            SELECT record_date, tmax, tmin, rainfall_mm, et0_mm
            FROM daily_weather
            ORDER BY record_date ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(DailyWeatherRecord::from).collect())
    }

    async fn get_ndvi_records(&self) -> AppResult<Vec<NdviRecord>> {
        let rows = sqlx::query_as::<_, NdviRow>(
            r#"
            SELECT id, observed_on, plot_id, ndvi, biomass
            FROM ndvi_records
            ORDER BY observed_on ASC, plot_id ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().filter_map(NdviRow::into_record).collect())
    }

    async fn get_pest_records(&self) -> AppResult<Vec<PestRecord>> {
        let rows = sqlx::query_as::<_, PestRow>(
            r#"
            SELECT id, observed_on, plot_id, pest, severity, area_ha, action
            FROM pest_records
            ORDER BY observed_on ASC, plot_id ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().filter_map(PestRow::into_record).collect())
    }

    async fn save_plot_metadata(&self, plot: PlotId, metadata: &PlotMetadata) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO plot_metadata (plot_id, reference_date, kc, variety, updated_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (plot_id) DO UPDATE
            SET reference_date = EXCLUDED.reference_date,
                kc = EXCLUDED.kc,
                variety = EXCLUDED.variety,
                updated_at = NOW()
            "#,
        )
        .bind(plot_id_to_db(plot))
        .bind(metadata.reference_date)
        .bind(metadata.kc)
        .bind(&metadata.variety)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn save_weekly_rows(&self, plot: PlotId, rows: &[WeeklyScheduleRow]) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        sqlx::query("DELETE FROM schedule_rows WHERE plot_id = $1")
            .bind(plot_id_to_db(plot))
            .execute(&mut *tx)
            .await?;

        for (index, row) in rows.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO schedule_rows (plot_id, week_index, label, range_start, range_end,
                                           scheduled_mm, actual_mm, effective_rain_mm, percent, comment)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                "#,
            )
            .bind(plot_id_to_db(plot))
            .bind(index as i16)
            .bind(&row.label)
            .bind(row.range.map(|r| r.start))
            .bind(row.range.map(|r| r.end))
            .bind(row.scheduled)
            .bind(row.actual)
            .bind(row.effective_rain)
            .bind(row.percent)
            .bind(&row.comment)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn save_agronomy_rows(&self, plot: PlotId, rows: &[AgronomyWeekRow]) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        sqlx::query("DELETE FROM agronomy_rows WHERE plot_id = $1")
            .bind(plot_id_to_db(plot))
            .execute(&mut *tx)
            .await?;

        for (index, row) in rows.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO agronomy_rows (plot_id, week_index, label, range_start, range_end,
                                           gain_cm, cumulative_cm, fertigation, chemigation)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(plot_id_to_db(plot))
            .bind(index as i16)
            .bind(&row.label)
            .bind(row.range.map(|r| r.start))
            .bind(row.range.map(|r| r.end))
            .bind(row.gain)
            .bind(row.cumulative)
            .bind(&row.fertigation)
            .bind(&row.chemigation)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn save_soil_state(&self, plot: PlotId, state: &SoilMoistureState) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO soil_state (plot_id, starting_balance_mm)
            VALUES ($1, $2)
            ON CONFLICT (plot_id) DO UPDATE SET starting_balance_mm = EXCLUDED.starting_balance_mm
            "#,
        )
        .bind(plot_id_to_db(plot))
        .bind(state.starting_balance)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM manual_soil_entries WHERE plot_id = $1")
            .bind(plot_id_to_db(plot))
            .execute(&mut *tx)
            .await?;

        for (date, entry) in &state.entries {
            sqlx::query(
                r#"
                INSERT INTO manual_soil_entries (plot_id, entry_date, effective_rain_mm, irrigation_mm)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(plot_id_to_db(plot))
            .bind(*date)
            .bind(entry.effective_rain)
            .bind(entry.irrigation)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn save_daily_weather(&self, records: &[DailyWeatherRecord]) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        sqlx::query("DELETE FROM daily_weather")
            .execute(&mut *tx)
            .await?;

        for record in records {
            sqlx::query(
                r#"
                INSERT INTO daily_weather (record_date, tmax, tmin, rainfall_mm, et0_mm)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (record_date) DO UPDATE
                SET tmax = EXCLUDED.tmax, tmin = EXCLUDED.tmin,
                    rainfall_mm = EXCLUDED.rainfall_mm, et0_mm = EXCLUDED.et0_mm
                "#,
            )
            .bind(record.date)
            .bind(record.tmax)
            .bind(record.tmin)
            .bind(record.rainfall)
            .bind(record.et0)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn append_ndvi_record(&self, record: &NdviRecord) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO ndvi_records (id, observed_on, plot_id, ndvi, biomass)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(record.id)
        .bind(record.date)
        .bind(plot_id_to_db(record.plot_id))
        .bind(record.ndvi)
        .bind(record.biomass)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn append_pest_record(&self, record: &PestRecord) -> AppResult<()> {
        insert_pest(&self.db, record).await
    }

    async fn save_pest_records(&self, records: &[PestRecord]) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        sqlx::query("DELETE FROM pest_records")
            .execute(&mut *tx)
            .await?;

        for record in records {
            insert_pest(&mut *tx, record).await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

async fn insert_pest<'e, E>(executor: E, record: &PestRecord) -> AppResult<()>
where
    E: sqlx::Executor<'e, Database = sqlx::Postgres>,
{
    sqlx::query(
        r#"
        INSERT INTO pest_records (id, observed_on, plot_id, pest, severity, area_ha, action)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(record.id)
    .bind(record.date)
    .bind(plot_id_to_db(record.plot_id))
    .bind(&record.pest)
    .bind(record.severity.as_str())
    .bind(record.area)
    .bind(&record.action)
    .execute(executor)
    .await?;

    Ok(())
}
