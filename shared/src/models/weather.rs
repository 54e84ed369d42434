//! Weather data models

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{checked_mean, checked_sum};

/// Estate weather for one calendar day
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyWeatherRecord {
    pub date: NaiveDate,
    pub tmax: Option<Decimal>,
    pub tmin: Option<Decimal>,
    pub rainfall: Option<Decimal>,
    /// Reference evapotranspiration (mm)
    pub et0: Option<Decimal>,
}

impl DailyWeatherRecord {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            tmax: None,
            tmin: None,
            rainfall: None,
            et0: None,
        }
    }
}

/// Sort by date and keep the last record submitted for each date
pub fn normalize_weather(records: Vec<DailyWeatherRecord>) -> Vec<DailyWeatherRecord> {
    let by_date: BTreeMap<NaiveDate, DailyWeatherRecord> =
        records.into_iter().map(|r| (r.date, r)).collect();
    by_date.into_values().collect()
}

/// Monthly weather summary
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthlyWeatherStats {
    /// `YYYY-MM`
    pub label: String,
    pub avg_tmax: Option<Decimal>,
    pub avg_tmin: Option<Decimal>,
    pub sum_rain: Option<Decimal>,
    pub avg_et0: Option<Decimal>,
    pub cum_et0: Option<Decimal>,
}

#[derive(Default)]
struct MonthAccumulator {
    tmax: Vec<Decimal>,
    tmin: Vec<Decimal>,
    rain: Vec<Decimal>,
    et0: Vec<Decimal>,
}

fn average(values: &[Decimal], dp: u32) -> Option<Decimal> {
    checked_mean(values).map(|mean| mean.round_dp(dp))
}

fn total(values: &[Decimal], dp: u32) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    checked_sum(values).map(|sum| sum.round_dp(dp))
}

/// Per-month statistics in chronological order.
///
/// Temperatures and rain at one decimal, ET0 at two. A month appears once it
/// has any numeric reading.
pub fn monthly_stats(records: &[DailyWeatherRecord]) -> Vec<MonthlyWeatherStats> {
    let mut months: BTreeMap<(i32, u32), MonthAccumulator> = BTreeMap::new();

    for record in records {
        let key = (record.date.year(), record.date.month());
        let fields = [record.tmax, record.tmin, record.rainfall, record.et0];
        if fields.iter().all(Option::is_none) {
            continue;
        }
        let acc = months.entry(key).or_default();
        if let Some(v) = record.tmax {
            acc.tmax.push(v);
        }
        if let Some(v) = record.tmin {
            acc.tmin.push(v);
        }
        if let Some(v) = record.rainfall {
            acc.rain.push(v);
        }
        if let Some(v) = record.et0 {
            acc.et0.push(v);
        }
    }

    months
        .into_iter()
        .map(|((year, month), acc)| MonthlyWeatherStats {
            label: format!("{}-{:02}", year, month),
            avg_tmax: average(&acc.tmax, 1),
            avg_tmin: average(&acc.tmin, 1),
            sum_rain: total(&acc.rain, 1),
            avg_et0: average(&acc.et0, 2),
            cum_et0: total(&acc.et0, 2),
        })
        .collect()
}

/// Forecast conditions grouped for display
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ForecastSymbol {
    Thunder,
    Rain,
    Snow,
    Cloud,
    Sun,
    PartlySunny,
}

impl ForecastSymbol {
    /// Classify a provider symbol code such as `lightrainshowers_day`
    pub fn from_code(code: Option<&str>) -> Self {
        let Some(code) = code else {
            return ForecastSymbol::PartlySunny;
        };
        let code = code.to_lowercase();
        if code.contains("thunder") {
            ForecastSymbol::Thunder
        } else if code.contains("rain") || code.contains("shower") {
            ForecastSymbol::Rain
        } else if code.contains("snow") {
            ForecastSymbol::Snow
        } else if code.contains("cloud") || code.contains("fog") {
            ForecastSymbol::Cloud
        } else if code.contains("sun") || code.contains("clear") {
            ForecastSymbol::Sun
        } else {
            ForecastSymbol::PartlySunny
        }
    }
}

/// One day of the external 7-day forecast
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForecastDay {
    pub date: Option<NaiveDate>,
    /// Raw date text from the provider, kept when it is not a valid date
    pub iso_date: String,
    pub temperature_celsius: Option<Decimal>,
    pub rain_mm: Decimal,
    pub symbol_code: Option<String>,
    pub symbol: ForecastSymbol,
}

impl ForecastDay {
    /// Chart label such as `Mon 25 Nov`
    pub fn chart_label(&self) -> String {
        match self.date {
            Some(date) => date.format("%a %d %b").to_string(),
            None => self.iso_date.clone(),
        }
    }
}

/// 7-day forecast; empty when the provider could not be reached
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Forecast {
    pub days: Vec<ForecastDay>,
}

impl Forecast {
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn record(y: i32, m: u32, d: u32, tmax: &str, rain: Option<&str>, et0: &str) -> DailyWeatherRecord {
        DailyWeatherRecord {
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            tmax: Some(dec(tmax)),
            tmin: None,
            rainfall: rain.map(dec),
            et0: Some(dec(et0)),
        }
    }

    #[test]
    fn test_monthly_stats() {
        let records = vec![
            record(2024, 1, 30, "31", Some("4"), "5.5"),
            record(2024, 1, 31, "32", None, "6.25"),
            record(2024, 2, 1, "29", Some("12.34"), "4"),
        ];
        let stats = monthly_stats(&records);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].label, "2024-01");
        assert_eq!(stats[0].avg_tmax, Some(dec("31.5")));
        assert_eq!(stats[0].avg_tmin, None);
        assert_eq!(stats[0].sum_rain, Some(dec("4")));
        assert_eq!(stats[0].avg_et0, Some(dec("5.88")));
        assert_eq!(stats[0].cum_et0, Some(dec("11.75")));
        assert_eq!(stats[1].sum_rain, Some(dec("12.3")));
    }

    #[test]
    fn test_normalize_weather_keeps_last() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let mut first = DailyWeatherRecord::new(date);
        first.et0 = Some(dec("4"));
        let mut second = DailyWeatherRecord::new(date);
        second.et0 = Some(dec("5"));
        let earlier = DailyWeatherRecord::new(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());

        let normalized = normalize_weather(vec![first, second, earlier]);
        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized[0].date.day(), 1);
        assert_eq!(normalized[1].et0, Some(dec("5")));
    }

    #[test]
    fn test_forecast_symbol() {
        assert_eq!(ForecastSymbol::from_code(Some("thunderstorm")), ForecastSymbol::Thunder);
        assert_eq!(ForecastSymbol::from_code(Some("lightrainshowers_day")), ForecastSymbol::Rain);
        assert_eq!(ForecastSymbol::from_code(Some("cloudy")), ForecastSymbol::Cloud);
        assert_eq!(ForecastSymbol::from_code(Some("clearsky_day")), ForecastSymbol::Sun);
        assert_eq!(ForecastSymbol::from_code(Some("partlycloudy_day")), ForecastSymbol::Cloud);
        assert_eq!(ForecastSymbol::from_code(None), ForecastSymbol::PartlySunny);
    }
}
