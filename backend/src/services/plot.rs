//! Plot schedule service: metadata, weekly irrigation rows and soil inputs

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::aggregation::{current_week_percent, season_total};
use shared::calendar::resolve_week_index;
use shared::types::{checked_mean, lenient};
use shared::validation::validate_starting_balance;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{
    ManualSoilEntry, PlotId, PlotMetadata, PlotRecords, WeekTable, WeeklyScheduleRow,
};
use crate::repository::Repository;
use crate::services::soil::{soil_view, SoilView};

/// Plot service for schedule editing and the plot page
#[derive(Clone)]
pub struct PlotService {
    repo: Repository,
}

/// Row in the plot list
#[derive(Debug, Serialize)]
pub struct PlotSummary {
    pub id: PlotId,
    pub name: String,
    pub reference_date: Option<NaiveDate>,
    pub kc: Option<Decimal>,
    pub variety: Option<String>,
    pub current_week_percent: Option<Decimal>,
    pub season_total: Option<Decimal>,
}

/// Average, minimum and maximum of the stored row percents
#[derive(Debug, Default, Serialize, PartialEq)]
pub struct PercentSummary {
    pub avg: Option<Decimal>,
    pub min: Option<Decimal>,
    pub max: Option<Decimal>,
}

/// Scheduled against delivered depth per week
#[derive(Debug, Default, Serialize)]
pub struct ScheduleChart {
    pub labels: Vec<String>,
    pub scheduled: Vec<Option<Decimal>>,
    pub delivered: Vec<Option<Decimal>>,
}

/// Everything the plot page shows
#[derive(Debug, Serialize)]
pub struct PlotView {
    pub id: PlotId,
    pub name: String,
    pub metadata: PlotMetadata,
    pub age_days: Option<i64>,
    pub age_months: Option<Decimal>,
    /// 1-based current week, when inside the season
    pub current_week: Option<i64>,
    pub current_week_percent: Option<Decimal>,
    pub season_total: Option<Decimal>,
    pub rows: Vec<WeeklyScheduleRow>,
    pub summary: PercentSummary,
    pub chart: ScheduleChart,
    pub soil: SoilView,
}

/// One submitted schedule row; unreadable numbers are treated as blank
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ScheduleRowInput {
    #[serde(default, deserialize_with = "lenient::decimal")]
    #[validate(custom = "shared::validation::rules::depth")]
    pub scheduled: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    #[validate(custom = "shared::validation::rules::depth")]
    pub actual: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    #[validate(custom = "shared::validation::rules::depth")]
    pub effective_rain: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub comment: Option<String>,
}

/// One submitted manual soil entry
#[derive(Debug, Default, Deserialize, Validate)]
pub struct SoilEntryInput {
    #[serde(default, deserialize_with = "lenient::date")]
    pub date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    #[validate(custom = "shared::validation::rules::depth")]
    pub effective_rain: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    #[validate(custom = "shared::validation::rules::depth")]
    pub irrigation: Option<Decimal>,
}

/// Input for replacing a plot's records
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdatePlotInput {
    #[serde(default, deserialize_with = "lenient::date")]
    pub reference_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub kc: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub variety: Option<String>,
    /// Kept unchanged when blank or not positive
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub starting_balance: Option<Decimal>,
    #[serde(default)]
    #[validate]
    pub rows: Vec<ScheduleRowInput>,
    #[serde(default)]
    #[validate]
    pub soil_entries: Vec<SoilEntryInput>,
}

impl PlotService {
    /// Create a new PlotService instance
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// All plots with their headline figures
    pub async fn list_plots(&self, today: NaiveDate) -> Vec<PlotSummary> {
        let snapshot = self.repo.read().await;
        snapshot
            .plots()
            .map(|(id, name, records)| PlotSummary {
                id,
                name: name.to_string(),
                reference_date: records.metadata.reference_date,
                kc: records.metadata.kc,
                variety: records.metadata.variety.clone(),
                current_week_percent: current_week_percent(records, today),
                season_total: season_total(records),
            })
            .collect()
    }

    /// Plot page for `today`
    pub async fn get_plot(&self, plot: PlotId, today: NaiveDate) -> AppResult<PlotView> {
        let snapshot = self.repo.read().await;
        let name = snapshot
            .registry()
            .name(plot)
            .ok_or_else(|| AppError::plot_not_found(plot))?;
        let records = snapshot
            .plot(plot)
            .ok_or_else(|| AppError::plot_not_found(plot))?;

        let age = records.metadata.age(today);
        let current_week = resolve_week_index(records.metadata.reference_date, today)
            .filter(|index| records.schedule.get(*index).is_some())
            .map(|index| index + 1);

        Ok(PlotView {
            id: plot,
            name: name.to_string(),
            metadata: records.metadata.clone(),
            age_days: age.map(|(days, _)| days),
            age_months: age.map(|(_, months)| months),
            current_week,
            current_week_percent: current_week_percent(records, today),
            season_total: season_total(records),
            rows: records.schedule.rows().to_vec(),
            summary: percent_summary(&records.schedule),
            chart: schedule_chart(&records.schedule),
            soil: soil_view(plot, name, records, snapshot.weather(), today),
        })
    }

    /// Replace metadata, schedule rows and soil inputs in one submission
    pub async fn update_plot(
        &self,
        plot: PlotId,
        input: UpdatePlotInput,
        today: NaiveDate,
    ) -> AppResult<PlotView> {
        input.validate()?;
        tracing::debug!(plot = %plot, "Replacing plot records");
        self.repo
            .update_plot(plot, |current| apply_update(current, input))
            .await?;
        self.get_plot(plot, today).await
    }
}

/// Build the replacement records for a plot from a submission
pub fn apply_update(current: PlotRecords, input: UpdatePlotInput) -> PlotRecords {
    let metadata = PlotMetadata {
        reference_date: input.reference_date,
        kc: input.kc,
        variety: input.variety,
    };

    let rows: Vec<WeeklyScheduleRow> = input
        .rows
        .into_iter()
        .map(|row| WeeklyScheduleRow {
            scheduled: row.scheduled,
            actual: row.actual,
            effective_rain: row.effective_rain,
            comment: row.comment.unwrap_or_default(),
            ..Default::default()
        })
        .collect();
    let mut schedule = WeekTable::from_rows(rows);
    schedule.recompute_percents();

    let mut soil = current.soil;
    if let Some(balance) = input
        .starting_balance
        .filter(|b| validate_starting_balance(*b).is_ok())
    {
        soil.starting_balance = balance;
    }
    soil.entries = input
        .soil_entries
        .into_iter()
        .filter_map(|entry| {
            let date = entry.date?;
            Some((
                date,
                ManualSoilEntry {
                    effective_rain: entry.effective_rain,
                    irrigation: entry.irrigation,
                },
            ))
        })
        .collect::<BTreeMap<_, _>>();

    let mut records = PlotRecords {
        metadata,
        schedule,
        agronomy: current.agronomy,
        soil,
    };
    records.apply_calendar();
    records
}

pub fn percent_summary(schedule: &WeekTable<WeeklyScheduleRow>) -> PercentSummary {
    let percents: Vec<Decimal> = schedule.iter().filter_map(|row| row.percent).collect();
    if percents.is_empty() {
        return PercentSummary::default();
    }
    PercentSummary {
        avg: checked_mean(&percents).map(|avg| avg.round_dp(1)),
        min: percents.iter().min().map(|p| p.round_dp(1)),
        max: percents.iter().max().map(|p| p.round_dp(1)),
    }
}

pub fn schedule_chart(schedule: &WeekTable<WeeklyScheduleRow>) -> ScheduleChart {
    ScheduleChart {
        labels: schedule.iter().map(|row| row.label.clone()).collect(),
        scheduled: schedule.iter().map(|row| row.scheduled).collect(),
        delivered: schedule.iter().map(WeeklyScheduleRow::delivered).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::models::PlotRegistry;
    use crate::services::agronomy::{AgronomyService, UpdateAgronomyInput};
    use crate::store::{MemoryRecordStore, RecordStore};

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn row(scheduled: &str, actual: &str) -> ScheduleRowInput {
        ScheduleRowInput {
            scheduled: Some(dec(scheduled)),
            actual: Some(dec(actual)),
            ..Default::default()
        }
    }

    #[test]
    fn test_apply_update_computes_percent_and_labels() {
        let input = UpdatePlotInput {
            reference_date: NaiveDate::from_ymd_opt(2024, 1, 3),
            rows: vec![row("40", "36"), ScheduleRowInput::default()],
            ..Default::default()
        };
        let records = apply_update(PlotRecords::default(), input);

        assert_eq!(records.schedule.len(), 52);
        assert_eq!(records.schedule.rows()[0].percent, Some(dec("90.0")));
        assert_eq!(records.schedule.rows()[1].percent, None);
        assert_eq!(records.schedule.rows()[0].label, "Week 1 (01 Jan–07 Jan)");
    }

    #[test]
    fn test_invalid_starting_balance_is_ignored() {
        let mut current = PlotRecords::default();
        current.soil.starting_balance = dec("95");

        let input = UpdatePlotInput {
            starting_balance: Some(dec("-4")),
            soil_entries: vec![
                SoilEntryInput {
                    date: NaiveDate::from_ymd_opt(2024, 2, 1),
                    irrigation: Some(dec("10")),
                    ..Default::default()
                },
                SoilEntryInput {
                    date: None,
                    irrigation: Some(dec("99")),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let records = apply_update(current, input);
        assert_eq!(records.soil.starting_balance, dec("95"));
        assert_eq!(records.soil.entries.len(), 1);
    }

    #[test]
    fn test_lenient_submission() {
        let input: UpdatePlotInput = serde_json::from_str(
            r#"{
                "reference_date": "not a date",
                "kc": "0.85",
                "variety": "  ",
                "rows": [{"scheduled": "30", "actual": "abc", "effective_rain": 27}]
            }"#,
        )
        .unwrap();
        assert_eq!(input.reference_date, None);
        assert_eq!(input.kc, Some(dec("0.85")));
        assert_eq!(input.variety, None);
        assert_eq!(input.rows[0].actual, None);

        let records = apply_update(PlotRecords::default(), input);
        assert_eq!(records.schedule.rows()[0].percent, Some(dec("90.0")));
    }

    #[test]
    fn test_negative_depth_is_rejected() {
        let input = UpdatePlotInput {
            rows: vec![row("40", "36"), row("40", "-2")],
            ..Default::default()
        };
        assert!(input.validate().is_err());

        let input = UpdatePlotInput {
            rows: vec![row("40", "36")],
            soil_entries: vec![SoilEntryInput {
                date: NaiveDate::from_ymd_opt(2024, 2, 1),
                irrigation: Some(dec("12")),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_extreme_depths_do_not_panic() {
        let input = UpdatePlotInput {
            rows: vec![row("0.00000000000000000001", "10000000000")],
            ..Default::default()
        };
        assert!(input.validate().is_err());

        let records = apply_update(PlotRecords::default(), input);
        assert_eq!(records.schedule.get(0).and_then(|r| r.percent), None);
        assert_eq!(percent_summary(&records.schedule), PercentSummary::default());
    }

    #[test]
    fn test_percent_summary() {
        let input = UpdatePlotInput {
            rows: vec![row("40", "36"), row("40", "30"), row("10", "12")],
            ..Default::default()
        };
        let records = apply_update(PlotRecords::default(), input);
        let summary = percent_summary(&records.schedule);
        assert_eq!(summary.avg, Some(dec("95.0")));
        assert_eq!(summary.min, Some(dec("75.0")));
        assert_eq!(summary.max, Some(dec("120.0")));

        assert_eq!(percent_summary(&WeekTable::new()), PercentSummary::default());
    }

    async fn services() -> (Arc<MemoryRecordStore>, PlotService, AgronomyService) {
        let store = Arc::new(MemoryRecordStore::new());
        let registry = PlotRegistry::new(vec!["North".into(), "South".into()]);
        let repo = Repository::load(store.clone(), registry, Decimal::from(120))
            .await
            .unwrap();
        (store, PlotService::new(repo.clone()), AgronomyService::new(repo))
    }

    fn growth(gain: &str) -> UpdateAgronomyInput {
        serde_json::from_str(&format!(r#"{{"rows": [{{"gain": "{}"}}]}}"#, gain)).unwrap()
    }

    #[tokio::test]
    async fn test_plot_update_keeps_agronomy_saved_after_a_stale_read() {
        let (store, plots, agronomy) = services().await;
        let today = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();

        let stale = plots.repo.read().await.plot(PlotId(1)).cloned().unwrap();
        assert!(stale.agronomy.rows()[0].gain.is_none());

        agronomy.update_agronomy(PlotId(1), growth("3"), today).await.unwrap();
        let input = UpdatePlotInput {
            reference_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            rows: vec![row("40", "36")],
            ..Default::default()
        };
        plots.update_plot(PlotId(1), input, today).await.unwrap();

        let snapshot = plots.repo.read().await;
        let records = snapshot.plot(PlotId(1)).unwrap();
        assert_eq!(records.agronomy.rows()[0].gain, Some(dec("3")));
        assert_eq!(records.schedule.rows()[0].percent, Some(dec("90.0")));

        let stored = store.get_agronomy_rows(PlotId(1)).await.unwrap();
        assert_eq!(stored[0].gain, Some(dec("3")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_plot_and_agronomy_saves_both_land() {
        let (store, plots, agronomy) = services().await;
        let today = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();

        let mut tasks = Vec::new();
        for i in 0..20u16 {
            let plots = plots.clone();
            let agronomy = agronomy.clone();
            tasks.push(tokio::spawn(async move {
                if i % 2 == 0 {
                    let input = UpdatePlotInput {
                        rows: vec![row("40", "36")],
                        ..Default::default()
                    };
                    plots.update_plot(PlotId(2), input, today).await.map(|_| ())
                } else {
                    agronomy.update_agronomy(PlotId(2), growth("1.5"), today).await.map(|_| ())
                }
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let snapshot = plots.repo.read().await;
        let records = snapshot.plot(PlotId(2)).unwrap();
        assert_eq!(records.agronomy.rows()[0].gain, Some(dec("1.5")));
        assert_eq!(records.schedule.rows()[0].actual, Some(dec("36")));
        assert_eq!(store.get_agronomy_rows(PlotId(2)).await.unwrap(), records.agronomy.rows());
        assert_eq!(store.get_weekly_rows(PlotId(2)).await.unwrap(), records.schedule.rows());
    }
}
