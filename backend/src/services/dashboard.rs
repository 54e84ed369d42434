//! Estate dashboard: comparison charts, weekly rollups, soil snapshot and forecast

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use shared::aggregation::{
    comparison_series, current_month_stats, current_week_agronomy, focus_series, latest_weather,
    ndvi_averages, pest_counts, previous_week_agronomy, previous_week_irrigation,
    previous_week_weather, select_focus_plots, soil_snapshot, ChartSeries, ComparisonView,
    GrowthSeries, SoilStatus, WeatherWindow,
};

use crate::config::SiteConfig;
use crate::external::ForecastClient;
use crate::models::{DailyWeatherRecord, Forecast, MonthlyWeatherStats, PlotId};
use crate::repository::Repository;

/// Weather rows shown in the dashboard's latest-weather table
pub const LATEST_WEATHER_DAYS: usize = 7;

#[derive(Clone)]
pub struct DashboardService {
    repo: Repository,
    forecast: ForecastClient,
    site: SiteConfig,
}

#[derive(Debug, Default)]
pub struct DashboardQuery {
    pub view: ComparisonView,
    pub focus: Vec<PlotId>,
}

/// Everything the dashboard page renders
#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub site_name: String,
    pub today: NaiveDate,
    pub view: ComparisonView,
    pub comparison: ChartSeries,
    pub focus_plots: Vec<PlotId>,
    pub focus: ChartSeries,
    pub previous_week_irrigation: ChartSeries,
    pub previous_week_agronomy: GrowthSeries,
    pub current_week_agronomy: GrowthSeries,
    pub previous_week_weather: WeatherWindow,
    pub soil: Vec<SoilStatus>,
    pub latest_weather: Vec<DailyWeatherRecord>,
    pub current_month: Option<MonthlyWeatherStats>,
    pub ndvi_averages: BTreeMap<String, Decimal>,
    pub pest_counts: BTreeMap<String, usize>,
    pub forecast: Forecast,
}

impl DashboardService {
    pub fn new(repo: Repository, forecast: ForecastClient, site: SiteConfig) -> Self {
        Self {
            repo,
            forecast,
            site,
        }
    }

    pub async fn build(&self, query: DashboardQuery, today: NaiveDate) -> Dashboard {
        // Fetch outside the snapshot lock; the provider may be slow
        let forecast = self.forecast.forecast_or_empty().await;

        let snapshot = self.repo.read().await;
        let focus_plots = select_focus_plots(&snapshot, &query.focus, self.site.focus_limit);
        tracing::debug!(view = ?query.view, focus = focus_plots.len(), %today, "Building dashboard");

        Dashboard {
            site_name: self.site.name.clone(),
            today,
            view: query.view,
            comparison: comparison_series(&snapshot, query.view, today),
            focus: focus_series(&snapshot, query.view, &focus_plots, today),
            focus_plots,
            previous_week_irrigation: previous_week_irrigation(&snapshot, today),
            previous_week_agronomy: previous_week_agronomy(&snapshot, today),
            current_week_agronomy: current_week_agronomy(&snapshot, today),
            previous_week_weather: previous_week_weather(&snapshot, today),
            soil: soil_snapshot(&snapshot, today),
            latest_weather: latest_weather(snapshot.weather(), today, LATEST_WEATHER_DAYS).to_vec(),
            current_month: current_month_stats(snapshot.weather(), today),
            ndvi_averages: ndvi_averages(&snapshot),
            pest_counts: pest_counts(&snapshot),
            forecast,
        }
    }
}
