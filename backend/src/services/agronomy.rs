//! Agronomy service: weekly growth, fertigation and chemigation records

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::aggregation::current_week_growth;
use shared::types::lenient;

use crate::error::{AppError, AppResult};
use crate::models::{AgronomyWeekRow, PlotId, WeekTable};
use crate::repository::Repository;

#[derive(Clone)]
pub struct AgronomyService {
    repo: Repository,
}

#[derive(Debug, Serialize)]
pub struct AgronomyView {
    pub id: PlotId,
    pub name: String,
    pub reference_date: Option<NaiveDate>,
    pub rows: Vec<AgronomyWeekRow>,
    pub current_gain: Option<Decimal>,
    pub current_cumulative: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AgronomyRowInput {
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub gain: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub fertigation: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub chemigation: Option<String>,
}

/// Agronomy submission; `variety` and `reference_date` are left unchanged
/// when absent or blank
#[derive(Debug, Default, Deserialize)]
pub struct UpdateAgronomyInput {
    #[serde(default, deserialize_with = "lenient::text")]
    pub variety: Option<String>,
    #[serde(default, deserialize_with = "lenient::date")]
    pub reference_date: Option<NaiveDate>,
    #[serde(default)]
    pub rows: Vec<AgronomyRowInput>,
}

impl AgronomyService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    pub async fn get_agronomy(&self, plot: PlotId, today: NaiveDate) -> AppResult<AgronomyView> {
        let snapshot = self.repo.read().await;
        let name = snapshot
            .registry()
            .name(plot)
            .ok_or_else(|| AppError::plot_not_found(plot))?;
        let records = snapshot
            .plot(plot)
            .ok_or_else(|| AppError::plot_not_found(plot))?;

        let (current_gain, current_cumulative) = current_week_growth(records, today);
        Ok(AgronomyView {
            id: plot,
            name: name.to_string(),
            reference_date: records.metadata.reference_date,
            rows: records.agronomy.rows().to_vec(),
            current_gain,
            current_cumulative,
        })
    }

    /// Replace every agronomy row and optionally the variety and reference
    /// date; the cumulative column is rebuilt
    pub async fn update_agronomy(
        &self,
        plot: PlotId,
        input: UpdateAgronomyInput,
        today: NaiveDate,
    ) -> AppResult<AgronomyView> {
        self.repo
            .update_plot(plot, |mut records| {
                if let Some(variety) = input.variety {
                    records.metadata.variety = Some(variety);
                }
                if let Some(date) = input.reference_date {
                    records.metadata.reference_date = Some(date);
                }
                records.agronomy = build_table(input.rows, records.metadata.first_monday());
                records
            })
            .await?;
        self.get_agronomy(plot, today).await
    }
}

pub fn build_table(
    rows: Vec<AgronomyRowInput>,
    first_monday: Option<NaiveDate>,
) -> WeekTable<AgronomyWeekRow> {
    let rows = rows
        .into_iter()
        .map(|row| AgronomyWeekRow {
            gain: row.gain,
            fertigation: row.fertigation.unwrap_or_default(),
            chemigation: row.chemigation.unwrap_or_default(),
            ..Default::default()
        })
        .collect();

    let mut table = WeekTable::from_rows(rows);
    table.recompute_cumulative();
    if let Some(monday) = first_monday {
        table.apply_calendar(monday);
    }
    table
}
