//! Per-plot aggregation for the dashboard charts
//!
//! Every function here is a pure read over a [`FarmSnapshot`] and a caller
//! supplied `today`. Plots without a resolvable value are skipped rather than
//! reported as zero, except where the view explicitly lists every plot.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::balance::{compute_balance, BalanceParams};
use crate::calendar::{previous_calendar_week, resolve_week_index};
use crate::compliance::{colors, compliance_band, compliance_percent, soil_band, SoilBand};
use crate::models::{
    monthly_stats, DailyWeatherRecord, FarmSnapshot, MonthlyWeatherStats, PlotId, PlotRecords,
};
use crate::types::{checked_mean, checked_sum, DateRange};

/// Which irrigation comparison to chart
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonView {
    /// Current-week compliance percent
    #[default]
    Week,
    /// Season total applied water (mm)
    Season,
}

impl ComparisonView {
    pub fn title(&self) -> &'static str {
        match self {
            ComparisonView::Week => "Irrigation Block Performance – Weekly % of Schedule",
            ComparisonView::Season => {
                "Irrigation Block Performance – Season Total Applied Water (mm)"
            }
        }
    }

    pub fn y_label(&self) -> &'static str {
        match self {
            ComparisonView::Week => "% of scheduled water",
            ComparisonView::Season => "Total depth (mm)",
        }
    }
}

/// Bar chart series, one bar per plot
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChartSeries {
    pub title: String,
    pub y_label: String,
    pub labels: Vec<String>,
    pub values: Vec<Decimal>,
    pub colors: Vec<String>,
}

impl ChartSeries {
    fn for_view(view: ComparisonView) -> Self {
        Self {
            title: view.title().to_string(),
            y_label: view.y_label().to_string(),
            ..Default::default()
        }
    }

    fn push(&mut self, label: &str, value: Decimal, color: &str) {
        self.labels.push(label.to_string());
        self.values.push(value);
        self.colors.push(color.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Stored compliance percent for the week containing `today`
pub fn current_week_percent(records: &PlotRecords, today: NaiveDate) -> Option<Decimal> {
    let index = resolve_week_index(records.metadata.reference_date, today)?;
    let row = records.schedule.get(index)?;
    row.percent.map(|p| p.round_dp(1))
}

/// Season total of actual plus effective rain (mm).
///
/// `None` when no row ever had either field, so a recorded zero still
/// produces `Some(0)`. An overflowing total is also `None`.
pub fn season_total(records: &PlotRecords) -> Option<Decimal> {
    let entered: Vec<Decimal> = records
        .schedule
        .iter()
        .flat_map(|row| [row.actual, row.effective_rain])
        .flatten()
        .collect();
    if entered.is_empty() {
        return None;
    }
    checked_sum(&entered).map(|total| total.round_dp(1))
}

/// Weekly gain and cumulative growth for the week containing `today`
pub fn current_week_growth(
    records: &PlotRecords,
    today: NaiveDate,
) -> (Option<Decimal>, Option<Decimal>) {
    let Some(row) = resolve_week_index(records.metadata.reference_date, today)
        .and_then(|index| records.agronomy.get(index))
    else {
        return (None, None);
    };
    (row.gain.map(|g| g.round_dp(1)), row.cumulative.map(|c| c.round_dp(1)))
}

/// Weather records up to and including `today`
fn history_until(weather: &[DailyWeatherRecord], today: NaiveDate) -> &[DailyWeatherRecord] {
    let end = weather.partition_point(|r| r.date <= today);
    &weather[..end]
}

/// Whole-history soil balance for a plot as of `today`
pub fn compute_soil_balance(
    records: &PlotRecords,
    weather: &[DailyWeatherRecord],
    today: NaiveDate,
) -> Decimal {
    let params = BalanceParams::new(Some(records.soil.starting_balance), records.metadata.kc);
    compute_balance(params, history_until(weather, today), &records.soil.entries)
}

/// Weather records inside `window`, in date order
pub fn weather_in_window<'a>(
    weather: &'a [DailyWeatherRecord],
    window: &DateRange,
) -> Vec<&'a DailyWeatherRecord> {
    weather.iter().filter(|r| window.contains(r.date)).collect()
}

fn view_value(view: ComparisonView, records: &PlotRecords, today: NaiveDate) -> Option<(Decimal, &'static str)> {
    match view {
        ComparisonView::Week => {
            let pct = current_week_percent(records, today)?;
            Some((pct, compliance_band(Some(pct)).color()))
        }
        ComparisonView::Season => season_total(records).map(|total| (total, colors::GREEN)),
    }
}

/// Comparison chart over every plot
pub fn comparison_series(snapshot: &FarmSnapshot, view: ComparisonView, today: NaiveDate) -> ChartSeries {
    let mut series = ChartSeries::for_view(view);
    for (_, name, records) in snapshot.plots() {
        if let Some((value, color)) = view_value(view, records, today) {
            series.push(name, value, color);
        }
    }
    series
}

/// Keep registered ids in request order, capped at `limit`.
///
/// Falls back to the first `limit` plots of the registry.
pub fn select_focus_plots(snapshot: &FarmSnapshot, requested: &[PlotId], limit: usize) -> Vec<PlotId> {
    let registry = snapshot.registry();
    let mut selected: Vec<PlotId> = Vec::new();
    for id in requested.iter().copied().filter(|id| registry.contains(*id)) {
        if selected.len() == limit {
            break;
        }
        if !selected.contains(&id) {
            selected.push(id);
        }
    }
    if selected.is_empty() {
        registry.ids().take(limit).collect()
    } else {
        selected
    }
}

/// Comparison chart over a focused subset of plots
pub fn focus_series(
    snapshot: &FarmSnapshot,
    view: ComparisonView,
    plots: &[PlotId],
    today: NaiveDate,
) -> ChartSeries {
    let mut series = ChartSeries::for_view(view);
    for id in plots {
        let (Some(name), Some(records)) = (snapshot.registry().name(*id), snapshot.plot(*id)) else {
            continue;
        };
        if let Some((value, color)) = view_value(view, records, today) {
            series.push(name, value, color);
        }
    }
    series
}

/// Scheduled and delivered sums over a window, for one plot
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WindowSums {
    pub scheduled: Decimal,
    pub actual: Decimal,
    pub effective_rain: Decimal,
    pub matched_rows: usize,
}

impl WindowSums {
    pub fn percent(&self) -> Option<Decimal> {
        compliance_percent(self.scheduled, self.actual, self.effective_rain)
    }
}

/// Sum every schedule row whose week overlaps `window`
pub fn irrigation_window_sums(records: &PlotRecords, window: &DateRange) -> WindowSums {
    let mut sums = WindowSums::default();
    for row in records.schedule.in_window(window) {
        sums.matched_rows += 1;
        sums.scheduled = sums.scheduled.saturating_add(row.scheduled.unwrap_or_default());
        sums.actual = sums.actual.saturating_add(row.actual.unwrap_or_default());
        sums.effective_rain = sums
            .effective_rain
            .saturating_add(row.effective_rain.unwrap_or_default());
    }
    sums
}

/// Compliance per plot for the previous Monday–Sunday.
///
/// Plots without a computable percent are left out.
pub fn previous_week_irrigation(snapshot: &FarmSnapshot, today: NaiveDate) -> ChartSeries {
    let window = previous_calendar_week(today);
    let mut series = ChartSeries {
        title: "Irrigation Performance – Previous Week".to_string(),
        y_label: ComparisonView::Week.y_label().to_string(),
        ..Default::default()
    };
    for (_, name, records) in snapshot.plots() {
        if let Some(pct) = irrigation_window_sums(records, &window).percent() {
            series.push(name, pct, compliance_band(Some(pct)).color());
        }
    }
    series
}

/// Growth figures for every plot
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GrowthSeries {
    pub labels: Vec<String>,
    pub weekly: Vec<Decimal>,
    pub cumulative: Vec<Decimal>,
}

impl GrowthSeries {
    fn push(&mut self, label: &str, weekly: Option<Decimal>, cumulative: Option<Decimal>) {
        self.labels.push(label.to_string());
        self.weekly.push(weekly.unwrap_or_default());
        self.cumulative.push(cumulative.unwrap_or_default());
    }
}

/// First agronomy row overlapping the previous calendar week, per plot.
///
/// Every plot is listed; plots without a match show zero.
pub fn previous_week_agronomy(snapshot: &FarmSnapshot, today: NaiveDate) -> GrowthSeries {
    let window = previous_calendar_week(today);
    let mut series = GrowthSeries::default();
    for (_, name, records) in snapshot.plots() {
        match records.agronomy.in_window(&window).next() {
            Some(row) => series.push(name, row.gain, row.cumulative),
            None => series.push(name, None, None),
        }
    }
    series
}

/// Growth for the current week of every plot
pub fn current_week_agronomy(snapshot: &FarmSnapshot, today: NaiveDate) -> GrowthSeries {
    let mut series = GrowthSeries::default();
    for (_, name, records) in snapshot.plots() {
        let (gain, cumulative) = current_week_growth(records, today);
        series.push(name, gain, cumulative);
    }
    series
}

/// Previous-week weather rows and chart series
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WeatherWindow {
    pub window: Option<DateRange>,
    pub rows: Vec<DailyWeatherRecord>,
    pub chart_labels: Vec<String>,
    pub chart_tmax: Vec<Option<Decimal>>,
    pub chart_rain: Vec<Decimal>,
}

/// Daily weather for the previous Monday–Sunday
pub fn previous_week_weather(snapshot: &FarmSnapshot, today: NaiveDate) -> WeatherWindow {
    let window = previous_calendar_week(today);
    let rows: Vec<DailyWeatherRecord> = weather_in_window(snapshot.weather(), &window)
        .into_iter()
        .cloned()
        .collect();
    WeatherWindow {
        window: Some(window),
        chart_labels: rows.iter().map(|r| r.date.format("%Y-%m-%d").to_string()).collect(),
        chart_tmax: rows.iter().map(|r| r.tmax).collect(),
        chart_rain: rows.iter().map(|r| r.rainfall.unwrap_or_default()).collect(),
        rows,
    }
}

/// The `count` most recent weather records, oldest first
pub fn latest_weather(weather: &[DailyWeatherRecord], today: NaiveDate, count: usize) -> &[DailyWeatherRecord] {
    let history = history_until(weather, today);
    &history[history.len().saturating_sub(count)..]
}

/// Statistics for the month containing `today`
pub fn current_month_stats(weather: &[DailyWeatherRecord], today: NaiveDate) -> Option<MonthlyWeatherStats> {
    let label = format!("{}-{:02}", today.year(), today.month());
    monthly_stats(weather).into_iter().find(|stats| stats.label == label)
}

/// Latest soil-moisture position of a plot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SoilStatus {
    pub plot_id: PlotId,
    pub name: String,
    pub balance: Decimal,
    pub tam: Decimal,
    pub percent: Decimal,
    pub band: SoilBand,
    pub color: String,
}

/// Soil position of one plot as of `today`
pub fn soil_status(
    id: PlotId,
    name: &str,
    records: &PlotRecords,
    weather: &[DailyWeatherRecord],
    today: NaiveDate,
) -> SoilStatus {
    let balance = compute_soil_balance(records, weather, today);
    let tam = records.soil.tam();
    let (percent, band) = soil_band(Some(balance), Some(tam));
    SoilStatus {
        plot_id: id,
        name: name.to_string(),
        balance: balance.round_dp(1),
        tam,
        percent: percent.round_dp(1),
        band,
        color: band.color().to_string(),
    }
}

/// Soil position of every plot
pub fn soil_snapshot(snapshot: &FarmSnapshot, today: NaiveDate) -> Vec<SoilStatus> {
    snapshot
        .plots()
        .map(|(id, name, records)| soil_status(id, name, records, snapshot.weather(), today))
        .collect()
}

/// Mean NDVI per plot name, three decimals
pub fn ndvi_averages(snapshot: &FarmSnapshot) -> BTreeMap<String, Decimal> {
    let mut readings: BTreeMap<PlotId, Vec<Decimal>> = BTreeMap::new();
    for record in snapshot.ndvi() {
        readings.entry(record.plot_id).or_default().push(record.ndvi);
    }
    readings
        .into_iter()
        .filter_map(|(id, values)| {
            let name = snapshot.registry().name(id)?;
            Some((name.to_string(), checked_mean(&values)?.round_dp(3)))
        })
        .collect()
}

/// Mean NDVI per observation date, three decimals
pub fn ndvi_by_date(snapshot: &FarmSnapshot) -> Vec<(NaiveDate, Decimal)> {
    let mut readings: BTreeMap<NaiveDate, Vec<Decimal>> = BTreeMap::new();
    for record in snapshot.ndvi() {
        readings.entry(record.date).or_default().push(record.ndvi);
    }
    readings
        .into_iter()
        .filter_map(|(date, values)| Some((date, checked_mean(&values)?.round_dp(3))))
        .collect()
}

/// Pest observations per plot name
pub fn pest_counts(snapshot: &FarmSnapshot) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for record in snapshot.pests() {
        if let Some(name) = snapshot.registry().name(record.plot_id) {
            *counts.entry(name.to_string()).or_insert(0) += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ManualSoilEntry, NdviRecord, PlotRegistry, WeeklyScheduleRow};
    use crate::types::FOCUS_PLOT_LIMIT;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn registry() -> PlotRegistry {
        PlotRegistry::new(vec!["North".into(), "South".into(), "East".into()])
    }

    fn plot_with_week(reference: NaiveDate, rows: Vec<WeeklyScheduleRow>) -> PlotRecords {
        let mut records = PlotRecords::default();
        records.metadata.reference_date = Some(reference);
        records.schedule = crate::models::WeekTable::from_rows(rows);
        records.schedule.recompute_percents();
        records.apply_calendar();
        records
    }

    fn row(scheduled: &str, actual: Option<&str>, eff: Option<&str>) -> WeeklyScheduleRow {
        WeeklyScheduleRow {
            scheduled: Some(dec(scheduled)),
            actual: actual.map(dec),
            effective_rain: eff.map(dec),
            ..Default::default()
        }
    }

    #[test]
    fn test_current_week_percent() {
        let records = plot_with_week(d(2024, 1, 1), vec![row("40", Some("30"), None), row("40", Some("40"), None)]);
        assert_eq!(current_week_percent(&records, d(2024, 1, 3)), Some(dec("75.0")));
        assert_eq!(current_week_percent(&records, d(2024, 1, 8)), Some(dec("100.0")));
        // Week 3 has no data
        assert_eq!(current_week_percent(&records, d(2024, 1, 15)), None);
        // Beyond the 52nd week
        assert_eq!(current_week_percent(&records, d(2025, 6, 1)), None);
        // Before the reference date
        assert_eq!(current_week_percent(&records, d(2023, 12, 31)), None);
    }

    #[test]
    fn test_season_total() {
        let mut records = PlotRecords::default();
        assert_eq!(season_total(&records), None);

        records.schedule = crate::models::WeekTable::from_rows(vec![WeeklyScheduleRow {
            actual: Some(Decimal::ZERO),
            ..Default::default()
        }]);
        assert_eq!(season_total(&records), Some(Decimal::ZERO));

        records.schedule = crate::models::WeekTable::from_rows(vec![
            row("0", Some("10"), None),
            row("0", None, Some("2.25")),
        ]);
        assert_eq!(season_total(&records), Some(dec("12.2")));

        records.schedule = crate::models::WeekTable::from_rows(vec![WeeklyScheduleRow {
            actual: Some(dec("50000000000000000000000000000")),
            effective_rain: Some(dec("50000000000000000000000000000")),
            ..Default::default()
        }]);
        assert_eq!(season_total(&records), None);
    }

    #[test]
    fn test_comparison_skips_plots_without_data() {
        let mut snapshot = FarmSnapshot::new(registry());
        snapshot.replace_plot(PlotId(2), plot_with_week(d(2024, 1, 1), vec![row("40", Some("20"), None)]));

        let week = comparison_series(&snapshot, ComparisonView::Week, d(2024, 1, 2));
        assert_eq!(week.labels, vec!["South".to_string()]);
        assert_eq!(week.values, vec![dec("50.0")]);
        assert_eq!(week.colors, vec![colors::AMBER.to_string()]);

        let season = comparison_series(&snapshot, ComparisonView::Season, d(2024, 1, 2));
        assert_eq!(season.values, vec![dec("20")]);
        assert_eq!(season.colors, vec![colors::GREEN.to_string()]);
    }

    #[test]
    fn test_previous_week_irrigation_sums_matching_rows() {
        let mut snapshot = FarmSnapshot::new(registry());
        snapshot.replace_plot(
            PlotId(1),
            plot_with_week(d(2024, 1, 1), vec![row("40", Some("10"), None), row("50", Some("40"), Some("5"))]),
        );
        // Today in week 3; previous calendar week is 8–14 Jan (row index 1)
        let series = previous_week_irrigation(&snapshot, d(2024, 1, 17));
        assert_eq!(series.labels, vec!["North".to_string()]);
        assert_eq!(series.values, vec![dec("90.0")]);
        assert_eq!(series.colors, vec![colors::BLUE.to_string()]);
    }

    #[test]
    fn test_previous_week_agronomy_lists_every_plot() {
        let mut snapshot = FarmSnapshot::new(registry());
        let mut records = PlotRecords::default();
        records.metadata.reference_date = Some(d(2024, 1, 1));
        records.agronomy.get_mut(1).unwrap().gain = Some(dec("4.2"));
        records.agronomy.get_mut(0).unwrap().gain = Some(dec("3"));
        records.agronomy.recompute_cumulative();
        records.apply_calendar();
        snapshot.replace_plot(PlotId(3), records);

        let series = previous_week_agronomy(&snapshot, d(2024, 1, 16));
        assert_eq!(series.labels.len(), 3);
        assert_eq!(series.weekly, vec![Decimal::ZERO, Decimal::ZERO, dec("4.2")]);
        assert_eq!(series.cumulative[2], dec("7.2"));
    }

    #[test]
    fn test_focus_selection() {
        let snapshot = FarmSnapshot::default();
        let default = select_focus_plots(&snapshot, &[], FOCUS_PLOT_LIMIT);
        assert_eq!(default, (1..=6).map(PlotId).collect::<Vec<_>>());

        let requested: Vec<PlotId> = [0, 3, 99, 5, 6, 7, 8, 9, 10].into_iter().map(PlotId).collect();
        let selected = select_focus_plots(&snapshot, &requested, FOCUS_PLOT_LIMIT);
        assert_eq!(selected, [3, 5, 6, 7, 8, 9].into_iter().map(PlotId).collect::<Vec<_>>());

        let repeated = select_focus_plots(&snapshot, &[PlotId(2), PlotId(2), PlotId(4)], 2);
        assert_eq!(repeated, vec![PlotId(2), PlotId(4)]);
    }

    #[test]
    fn test_soil_snapshot_stops_at_today() {
        let mut snapshot = FarmSnapshot::new(registry());
        let weather = (1..=4)
            .map(|day| DailyWeatherRecord {
                et0: Some(dec("6")),
                ..DailyWeatherRecord::new(d(2024, 3, day))
            })
            .collect();
        snapshot.set_weather(weather);
        if let Some(records) = snapshot.plot_mut(PlotId(1)) {
            records.soil.entries.insert(
                d(2024, 3, 2),
                ManualSoilEntry { effective_rain: Some(dec("2")), irrigation: None },
            );
        }

        let statuses = soil_snapshot(&snapshot, d(2024, 3, 2));
        assert_eq!(statuses[0].balance, dec("110"));
        assert_eq!(statuses[1].balance, dec("108"));
        assert_eq!(statuses[1].percent, dec("90.0"));
        assert_eq!(statuses[1].band, SoilBand::NearFull);
    }

    #[test]
    fn test_ndvi_and_pest_rollups() {
        let mut snapshot = FarmSnapshot::new(registry());
        snapshot.set_ndvi(vec![
            NdviRecord::new(d(2024, 4, 1), PlotId(1), dec("0.5")),
            NdviRecord::new(d(2024, 4, 8), PlotId(1), dec("0.6")),
            NdviRecord::new(d(2024, 4, 8), PlotId(2), dec("0.71")),
        ]);
        let averages = ndvi_averages(&snapshot);
        assert_eq!(averages.get("North"), Some(&dec("0.55")));
        assert_eq!(averages.get("South"), Some(&dec("0.71")));

        let by_date = ndvi_by_date(&snapshot);
        assert_eq!(by_date[1], (d(2024, 4, 8), dec("0.655")));
        assert!(pest_counts(&snapshot).is_empty());
    }

    #[test]
    fn test_latest_weather_and_month() {
        let weather: Vec<DailyWeatherRecord> = (1..=12)
            .map(|day| DailyWeatherRecord {
                rainfall: Some(dec("1.5")),
                ..DailyWeatherRecord::new(d(2024, 5, day))
            })
            .collect();

        let latest = latest_weather(&weather, d(2024, 5, 10), 7);
        assert_eq!(latest.len(), 7);
        assert_eq!(latest[0].date, d(2024, 5, 4));
        assert_eq!(latest[6].date, d(2024, 5, 10));

        let month = current_month_stats(&weather, d(2024, 5, 20)).unwrap();
        assert_eq!(month.sum_rain, Some(dec("18.0")));
        assert!(current_month_stats(&weather, d(2024, 6, 1)).is_none());
    }
}
