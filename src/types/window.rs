//! Search date windows.
//!
//! The portal's calendar inputs take `MM/DD/YYYY` strings; `SearchWindow`
//! keeps the dates typed and renders them on demand.

use chrono::{Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Date format accepted by the portal's calendar inputs.
pub const PORTAL_DATE_FORMAT: &str = "%m/%d/%Y";

/// Inclusive date range for a record search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl SearchWindow {
    /// Window ending at `today` and starting `days` days earlier.
    pub fn lookback(today: NaiveDate, days: u32) -> Self {
        Self {
            from: today - Duration::days(i64::from(days)),
            to: today,
        }
    }

    /// Window ending today (local time).
    pub fn lookback_from_today(days: u32) -> Self {
        Self::lookback(Local::now().date_naive(), days)
    }

    /// The "from" date as the portal expects it.
    pub fn from_str_portal(&self) -> String {
        self.from.format(PORTAL_DATE_FORMAT).to_string()
    }

    /// The "to" date as the portal expects it.
    pub fn to_str_portal(&self) -> String {
        self.to.format(PORTAL_DATE_FORMAT).to_string()
    }
}

impl fmt::Display for SearchWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.from_str_portal(), self.to_str_portal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookback_formats_portal_dates() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let window = SearchWindow::lookback(today, 90);
        assert_eq!(window.to_str_portal(), "03/15/2024");
        // 2024 is a leap year: 90 days back from March 15 is December 16.
        assert_eq!(window.from_str_portal(), "12/16/2023");
    }

    #[test]
    fn test_zero_day_window() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        let window = SearchWindow::lookback(today, 0);
        assert_eq!(window.from, window.to);
        assert_eq!(window.to_string(), "01/02/2025 - 01/02/2025");
    }
}
