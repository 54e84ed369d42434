//! In-memory working snapshot of the estate records

use std::collections::BTreeMap;

use serde::Serialize;

use super::observation::{NdviRecord, PestRecord};
use super::plot::{PlotId, PlotMetadata, PlotRegistry};
use super::schedule::{AgronomyWeekRow, WeekTable, WeeklyScheduleRow};
use super::soil::SoilMoistureState;
use super::weather::{normalize_weather, DailyWeatherRecord};

/// Everything recorded for a single plot
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct PlotRecords {
    pub metadata: PlotMetadata,
    pub schedule: WeekTable<WeeklyScheduleRow>,
    pub agronomy: WeekTable<AgronomyWeekRow>,
    pub soil: SoilMoistureState,
}

impl PlotRecords {
    /// Relabel both week tables from the reference date, if one is set
    pub fn apply_calendar(&mut self) {
        if let Some(first_monday) = self.metadata.first_monday() {
            self.schedule.apply_calendar(first_monday);
            self.agronomy.apply_calendar(first_monday);
        }
    }
}

/// Computation input for every aggregation run
#[derive(Debug, Clone, Serialize)]
pub struct FarmSnapshot {
    registry: PlotRegistry,
    plots: BTreeMap<PlotId, PlotRecords>,
    /// Sorted ascending, one record per date
    weather: Vec<DailyWeatherRecord>,
    ndvi: Vec<NdviRecord>,
    pests: Vec<PestRecord>,
}

impl FarmSnapshot {
    /// Snapshot with default (empty) records for every registered plot
    pub fn new(registry: PlotRegistry) -> Self {
        let plots = registry
            .ids()
            .map(|id| (id, PlotRecords::default()))
            .collect();
        Self {
            registry,
            plots,
            weather: Vec::new(),
            ndvi: Vec::new(),
            pests: Vec::new(),
        }
    }

    pub fn registry(&self) -> &PlotRegistry {
        &self.registry
    }

    pub fn plot(&self, id: PlotId) -> Option<&PlotRecords> {
        self.plots.get(&id)
    }

    pub fn plot_mut(&mut self, id: PlotId) -> Option<&mut PlotRecords> {
        self.plots.get_mut(&id)
    }

    /// Plots in registry order with their names
    pub fn plots(&self) -> impl Iterator<Item = (PlotId, &str, &PlotRecords)> + '_ {
        self.registry
            .entries()
            .filter_map(|(id, name)| self.plots.get(&id).map(|records| (id, name, records)))
    }

    /// Replace a plot's records; ids outside the registry are ignored
    pub fn replace_plot(&mut self, id: PlotId, records: PlotRecords) -> bool {
        if !self.registry.contains(id) {
            return false;
        }
        self.plots.insert(id, records);
        true
    }

    pub fn weather(&self) -> &[DailyWeatherRecord] {
        &self.weather
    }

    /// Replace the weather series, normalising order and duplicate dates
    pub fn set_weather(&mut self, records: Vec<DailyWeatherRecord>) {
        self.weather = normalize_weather(records);
    }

    pub fn ndvi(&self) -> &[NdviRecord] {
        &self.ndvi
    }

    pub fn set_ndvi(&mut self, mut records: Vec<NdviRecord>) {
        records.sort_by_key(|r| (r.date, r.plot_id));
        self.ndvi = records;
    }

    pub fn pests(&self) -> &[PestRecord] {
        &self.pests
    }

    pub fn set_pests(&mut self, mut records: Vec<PestRecord>) {
        records.sort_by_key(|r| (r.date, r.plot_id));
        self.pests = records;
    }
}

impl Default for FarmSnapshot {
    fn default() -> Self {
        Self::new(PlotRegistry::default())
    }
}
