//! HTTP handlers for the Estate Irrigation Monitor API

pub mod admin;
pub mod agronomy;
pub mod dashboard;
pub mod health;
pub mod observation;
pub mod plot;
pub mod soil;
pub mod weather;

pub use admin::*;
pub use agronomy::*;
pub use dashboard::*;
pub use health::*;
pub use observation::*;
pub use plot::*;
pub use soil::*;
pub use weather::*;

use chrono::NaiveDate;
use serde::Deserialize;
use shared::types::parse_date;

/// `?today=YYYY-MM-DD` override for the evaluation date
#[derive(Debug, Default, Deserialize)]
pub struct TodayQuery {
    pub today: Option<String>,
}

impl TodayQuery {
    /// Requested date, or the local date when absent or unreadable
    pub fn resolve(&self) -> NaiveDate {
        resolve_today(self.today.as_deref())
    }
}

pub(crate) fn resolve_today(requested: Option<&str>) -> NaiveDate {
    requested
        .and_then(parse_date)
        .unwrap_or_else(|| chrono::Local::now().date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_today_override() {
        let query = TodayQuery {
            today: Some("2024-03-11".into()),
        };
        assert_eq!(query.resolve(), NaiveDate::from_ymd_opt(2024, 3, 11).unwrap());

        let fallback = TodayQuery {
            today: Some("11/03/2024".into()),
        };
        assert_eq!(fallback.resolve(), chrono::Local::now().date_naive());
    }
}
