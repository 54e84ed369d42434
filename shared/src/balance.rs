//! Single-bucket soil-moisture accumulator
//!
//! Balance_today = Balance_start − ΣETc + Σ(effective rain + irrigation),
//! clamped to `[0, starting balance]` after every day. Days must be walked in
//! ascending order: clamping makes the result order-dependent.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{effective_kc, DailyWeatherRecord, ManualSoilEntry};
use crate::types::DEFAULT_STARTING_BALANCE_MM;

/// Accumulator inputs with defaults already applied
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalanceParams {
    /// Opening balance and ceiling (mm)
    pub starting_balance: Decimal,
    pub kc: Decimal,
}

impl BalanceParams {
    /// Missing starting balance → 120 mm; missing or non-positive Kc → 1.0
    pub fn new(starting_balance: Option<Decimal>, kc: Option<Decimal>) -> Self {
        Self {
            starting_balance: starting_balance.unwrap_or(DEFAULT_STARTING_BALANCE_MM),
            kc: effective_kc(kc),
        }
    }

    fn ceiling(&self) -> Decimal {
        self.starting_balance.max(Decimal::ZERO)
    }

    fn clamp(&self, balance: Decimal) -> Decimal {
        balance.max(Decimal::ZERO).min(self.ceiling())
    }

    /// Crop evapotranspiration, saturating on absurd ET0
    fn etc(&self, et0: Decimal) -> Decimal {
        et0.saturating_mul(self.kc)
    }
}

/// One day's unclamped balance; saturates so the clamp can still apply
fn step(balance: Decimal, etc: Decimal, eff: Option<Decimal>, irr: Option<Decimal>) -> Decimal {
    balance
        .saturating_sub(etc)
        .saturating_add(eff.unwrap_or_default())
        .saturating_add(irr.unwrap_or_default())
}

/// One day of the balance table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BalanceDay {
    pub date: NaiveDate,
    pub et0: Decimal,
    pub kc: Decimal,
    pub etc: Decimal,
    /// Raw rainfall, informational only
    pub rain: Decimal,
    pub effective_rain: Option<Decimal>,
    pub irrigation: Option<Decimal>,
    pub balance: Decimal,
}

fn manual_for(
    entries: &BTreeMap<NaiveDate, ManualSoilEntry>,
    date: NaiveDate,
) -> (Option<Decimal>, Option<Decimal>) {
    entries
        .get(&date)
        .map(|e| (e.effective_rain, e.irrigation))
        .unwrap_or((None, None))
}

/// Whole-history balance, rounded once at the end.
///
/// `daily_series` must be sorted ascending by date.
pub fn compute_balance(
    params: BalanceParams,
    daily_series: &[DailyWeatherRecord],
    manual_entries: &BTreeMap<NaiveDate, ManualSoilEntry>,
) -> Decimal {
    let mut balance = params.clamp(params.starting_balance);

    for day in daily_series {
        let etc = params.etc(day.et0.unwrap_or_default());
        let (eff, irr) = manual_for(manual_entries, day.date);
        balance = params.clamp(step(balance, etc, eff, irr));
    }

    balance.round_dp(1)
}

/// Day-by-day balance table.
///
/// ETc is rounded to two decimals and the balance to one decimal every day,
/// so the table reads consistently row to row.
pub fn balance_table(
    params: BalanceParams,
    daily_series: &[DailyWeatherRecord],
    manual_entries: &BTreeMap<NaiveDate, ManualSoilEntry>,
) -> Vec<BalanceDay> {
    let mut balance = params.clamp(params.starting_balance);

    daily_series
        .iter()
        .map(|day| {
            let et0 = day.et0.unwrap_or_default();
            let etc = params.etc(et0).round_dp(2);
            let (eff, irr) = manual_for(manual_entries, day.date);

            balance = params.clamp(step(balance, etc, eff, irr).round_dp(1));

            BalanceDay {
                date: day.date,
                et0,
                kc: params.kc,
                etc,
                rain: day.rainfall.unwrap_or_default(),
                effective_rain: eff,
                irrigation: irr,
                balance,
            }
        })
        .collect()
}
