//! Soil-moisture balance integration tests
//!
//! Tests for the single-bucket accumulator including:
//! - Clamp invariant on every computed day
//! - Order sensitivity around a mid-sequence overflow
//! - Default starting balance and Kc handling

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::balance::{balance_table, compute_balance, BalanceParams};
use shared::models::{DailyWeatherRecord, ManualSoilEntry};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn jan(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
}

fn weather_day(date: NaiveDate, et0: Option<Decimal>) -> DailyWeatherRecord {
    DailyWeatherRecord {
        et0,
        ..DailyWeatherRecord::new(date)
    }
}

fn irrigation(mm: &str) -> ManualSoilEntry {
    ManualSoilEntry {
        effective_rain: None,
        irrigation: Some(dec(mm)),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// 120 mm start, 5 mm ET0 on day one, 10 mm irrigation on day two
    #[test]
    fn test_overflow_is_not_carried() {
        let params = BalanceParams::new(Some(dec("120")), Some(dec("1.0")));
        let series = vec![
            weather_day(jan(1), Some(dec("5.0"))),
            weather_day(jan(2), Some(dec("0"))),
        ];
        let mut entries = BTreeMap::new();
        entries.insert(jan(2), irrigation("10"));

        let table = balance_table(params, &series, &entries);
        assert_eq!(table[0].balance, dec("115.0"));
        assert_eq!(table[1].balance, dec("120.0"));
        assert_eq!(compute_balance(params, &series, &entries), dec("120.0"));
    }

    /// Missing starting balance falls back to 120 mm, bad Kc to 1.0
    #[test]
    fn test_defaults() {
        let params = BalanceParams::new(None, Some(dec("-0.4")));
        assert_eq!(params.starting_balance, dec("120"));
        assert_eq!(params.kc, dec("1.0"));

        let params = BalanceParams::new(Some(dec("80")), None);
        assert_eq!(params.kc, dec("1.0"));
    }

    /// Kc scales ET0 into crop demand
    #[test]
    fn test_kc_scales_demand() {
        let params = BalanceParams::new(Some(dec("100")), Some(dec("0.85")));
        let series = vec![weather_day(jan(1), Some(dec("4.2")))];

        let table = balance_table(params, &series, &BTreeMap::new());
        assert_eq!(table[0].etc, dec("3.57"));
        assert_eq!(table[0].balance, dec("96.4"));
    }

    /// Missing ET0 counts as no demand
    #[test]
    fn test_missing_et0_is_zero() {
        let params = BalanceParams::new(Some(dec("50")), None);
        let series = vec![weather_day(jan(1), None), weather_day(jan(2), None)];
        assert_eq!(compute_balance(params, &series, &BTreeMap::new()), dec("50"));
    }

    /// The bucket never goes below empty
    #[test]
    fn test_floor_at_zero() {
        let params = BalanceParams::new(Some(dec("10")), None);
        let series = vec![
            weather_day(jan(1), Some(dec("8"))),
            weather_day(jan(2), Some(dec("8"))),
        ];
        let mut entries = BTreeMap::new();
        entries.insert(jan(2), irrigation("3"));

        let table = balance_table(params, &series, &entries);
        assert_eq!(table[0].balance, dec("2.0"));
        assert_eq!(table[1].balance, dec("0"));
    }

    /// Clamping makes the walk order-dependent
    #[test]
    fn test_order_sensitivity() {
        let params = BalanceParams::new(Some(dec("100")), None);

        // Irrigation overflows before the demand day
        let forward = vec![weather_day(jan(1), None), weather_day(jan(2), Some(dec("50")))];
        let mut forward_entries = BTreeMap::new();
        forward_entries.insert(jan(1), irrigation("50"));

        // Demand first, then the same irrigation refills
        let reverse = vec![weather_day(jan(1), Some(dec("50"))), weather_day(jan(2), None)];
        let mut reverse_entries = BTreeMap::new();
        reverse_entries.insert(jan(2), irrigation("50"));

        assert_eq!(compute_balance(params, &forward, &forward_entries), dec("50"));
        assert_eq!(compute_balance(params, &reverse, &reverse_entries), dec("100"));
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Starting balance between 10 and 200 mm
    fn start_strategy() -> impl Strategy<Value = Decimal> {
        (100i64..=2000i64).prop_map(|v| Decimal::new(v, 1))
    }

    /// Kc between 0.1 and 1.5
    fn kc_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=15i64).prop_map(|v| Decimal::new(v, 1))
    }

    /// Per-day (ET0, effective rain, irrigation) in tenths of a millimetre
    fn day_strategy() -> impl Strategy<Value = (i64, Option<i64>, Option<i64>)> {
        (
            0i64..=120i64,
            prop::option::of(0i64..=400i64),
            prop::option::of(0i64..=600i64),
        )
    }

    fn build_inputs(
        days: &[(i64, Option<i64>, Option<i64>)],
    ) -> (Vec<DailyWeatherRecord>, BTreeMap<NaiveDate, ManualSoilEntry>) {
        let mut series = Vec::new();
        let mut entries = BTreeMap::new();
        for (i, (et0, eff, irr)) in days.iter().enumerate() {
            let date = jan(1) + Duration::days(i as i64);
            series.push(weather_day(date, Some(Decimal::new(*et0, 1))));
            if eff.is_some() || irr.is_some() {
                entries.insert(
                    date,
                    ManualSoilEntry {
                        effective_rain: eff.map(|v| Decimal::new(v, 1)),
                        irrigation: irr.map(|v| Decimal::new(v, 1)),
                    },
                );
            }
        }
        (series, entries)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Every table row stays within [0, starting balance]
        #[test]
        fn prop_table_rows_are_clamped(
            start in start_strategy(),
            kc in kc_strategy(),
            days in prop::collection::vec(day_strategy(), 1..60)
        ) {
            let params = BalanceParams::new(Some(start), Some(kc));
            let (series, entries) = build_inputs(&days);

            let table = balance_table(params, &series, &entries);
            prop_assert_eq!(table.len(), series.len());
            for row in &table {
                prop_assert!(row.balance >= Decimal::ZERO);
                prop_assert!(row.balance <= start);
            }
        }

        /// The whole-history balance is clamped as well
        #[test]
        fn prop_whole_history_is_clamped(
            start in start_strategy(),
            kc in kc_strategy(),
            days in prop::collection::vec(day_strategy(), 0..90)
        ) {
            let params = BalanceParams::new(Some(start), Some(kc));
            let (series, entries) = build_inputs(&days);

            let balance = compute_balance(params, &series, &entries);
            prop_assert!(balance >= Decimal::ZERO);
            prop_assert!(balance <= start.round_dp(1));
        }

        /// With no inputs at all the bucket only drains
        #[test]
        fn prop_no_water_never_increases(
            start in start_strategy(),
            et0s in prop::collection::vec(0i64..=80i64, 1..30)
        ) {
            let params = BalanceParams::new(Some(start), None);
            let series: Vec<DailyWeatherRecord> = et0s
                .iter()
                .enumerate()
                .map(|(i, v)| weather_day(jan(1) + Duration::days(i as i64), Some(Decimal::new(*v, 1))))
                .collect();

            let table = balance_table(params, &series, &BTreeMap::new());
            let mut previous = start;
            for row in &table {
                prop_assert!(row.balance <= previous);
                previous = row.balance;
            }
        }
    }
}
