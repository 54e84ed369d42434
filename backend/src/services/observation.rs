//! Field observation service: NDVI readings and pest scouting

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::aggregation::{ndvi_averages, ndvi_by_date, pest_counts};
use shared::types::lenient;
use shared::validation::validate_plot_id;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{NdviRecord, PestRecord, PestSeverity, PlotId};
use crate::repository::Repository;

#[derive(Clone)]
pub struct ObservationService {
    repo: Repository,
}

/// Input for recording an NDVI reading
#[derive(Debug, Deserialize, Validate)]
pub struct NdviInput {
    pub date: NaiveDate,
    pub plot_id: PlotId,
    #[validate(custom = "shared::validation::rules::ndvi")]
    pub ndvi: Decimal,
}

/// Input for recording a pest observation
#[derive(Debug, Default, Deserialize, Validate)]
pub struct PestInput {
    #[serde(default, deserialize_with = "lenient::date")]
    pub date: Option<NaiveDate>,
    pub plot_id: Option<PlotId>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub pest: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub severity: Option<String>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    #[validate(custom = "shared::validation::rules::area")]
    pub area: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub action: Option<String>,
}

impl PestInput {
    /// Record for this input; `None` without a date, plot or pest name
    pub fn into_record(self) -> Option<PestRecord> {
        Some(PestRecord {
            id: Uuid::new_v4(),
            date: self.date?,
            plot_id: self.plot_id?,
            pest: self.pest?,
            severity: self
                .severity
                .as_deref()
                .map(PestSeverity::parse)
                .unwrap_or_default(),
            area: self.area,
            action: self.action.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct NdviOverview {
    pub records: Vec<NdviRecord>,
    pub chart_labels: Vec<String>,
    pub chart_values: Vec<Decimal>,
    pub plot_averages: Vec<(String, Decimal)>,
}

#[derive(Debug, Serialize)]
pub struct PestOverview {
    pub records: Vec<PestRecord>,
    pub counts: Vec<(String, usize)>,
}

impl ObservationService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    pub async fn ndvi_overview(&self) -> NdviOverview {
        let snapshot = self.repo.read().await;
        let (chart_labels, chart_values) = ndvi_by_date(&snapshot)
            .into_iter()
            .map(|(date, avg)| (date.format("%Y-%m-%d").to_string(), avg))
            .unzip();
        NdviOverview {
            records: snapshot.ndvi().to_vec(),
            chart_labels,
            chart_values,
            plot_averages: ndvi_averages(&snapshot).into_iter().collect(),
        }
    }

    /// Record a reading; biomass is estimated from the index
    pub async fn add_ndvi(&self, input: NdviInput) -> AppResult<NdviRecord> {
        input.validate()?;
        validate_plot_id(self.repo.registry(), input.plot_id)
            .map_err(|e| AppError::invalid("plot_id", e.to_string()))?;

        let record = NdviRecord::new(input.date, input.plot_id, input.ndvi);
        self.repo.append_ndvi(record.clone()).await?;
        Ok(record)
    }

    pub async fn pest_overview(&self) -> PestOverview {
        let snapshot = self.repo.read().await;
        PestOverview {
            records: snapshot.pests().to_vec(),
            counts: pest_counts(&snapshot).into_iter().collect(),
        }
    }

    pub async fn add_pest(&self, input: PestInput) -> AppResult<PestRecord> {
        input.validate()?;
        let record = input
            .into_record()
            .ok_or_else(|| AppError::ValidationError("date, plot_id and pest are required".into()))?;
        validate_plot_id(self.repo.registry(), record.plot_id)
            .map_err(|e| AppError::invalid("plot_id", e.to_string()))?;

        self.repo.append_pest(record.clone()).await?;
        Ok(record)
    }

    /// Replace every pest record; incomplete or invalid rows are dropped
    pub async fn replace_pests(&self, inputs: Vec<PestInput>) -> AppResult<usize> {
        let registry = self.repo.registry().clone();
        let records: Vec<PestRecord> = inputs
            .into_iter()
            .filter(|input| input.validate().is_ok())
            .filter_map(PestInput::into_record)
            .filter(|record| validate_plot_id(&registry, record.plot_id).is_ok())
            .collect();
        let kept = records.len();
        self.repo.replace_pests(records).await?;
        Ok(kept)
    }
}
