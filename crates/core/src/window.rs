//! Trailing time windows relative to "now"

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::data::{format_date, parse_date};
use crate::error::Error;

/// Length of the leaderboard activity window in days
pub const LEADERBOARD_WINDOW_DAYS: i64 = 30;

/// Selectable chart range
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum TimeRange {
    #[serde(rename = "30d")]
    Days30,
    #[serde(rename = "90d")]
    Days90,
    #[serde(rename = "1y")]
    Year,
    #[default]
    #[serde(rename = "all")]
    All,
}

impl TimeRange {
    pub const ALL_RANGES: [TimeRange; 4] = [
        TimeRange::Days30,
        TimeRange::Days90,
        TimeRange::Year,
        TimeRange::All,
    ];

    /// Button label
    pub fn label(&self) -> &'static str {
        match self {
            TimeRange::Days30 => "30d",
            TimeRange::Days90 => "90d",
            TimeRange::Year => "1y",
            TimeRange::All => "All",
        }
    }

    /// Window length, `None` for the unbounded range
    pub fn days(&self) -> Option<i64> {
        match self {
            TimeRange::Days30 => Some(30),
            TimeRange::Days90 => Some(90),
            TimeRange::Year => Some(365),
            TimeRange::All => None,
        }
    }

    /// Earliest instant kept by this range
    ///
    /// Measured from wall-clock `now`, not from the newest sample, so a stale
    /// series keeps fewer points than the label suggests.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.days().map(|days| now - Duration::days(days))
    }

    /// Whether an ISO date falls inside the range
    ///
    /// Dates are taken at 00:00 UTC. Unparseable dates are kept only by the
    /// unbounded range.
    pub fn contains(&self, date: &str, now: DateTime<Utc>) -> bool {
        let Some(cutoff) = self.cutoff(now) else {
            return true;
        };
        match parse_date(date) {
            Ok(day) => start_of_day(day) >= cutoff,
            Err(_) => false,
        }
    }

    /// Keep the items whose date falls inside the range
    pub fn filter<T, F>(&self, items: Vec<T>, now: DateTime<Utc>, date_of: F) -> Vec<T>
    where
        F: Fn(&T) -> &str,
    {
        if self.days().is_none() {
            return items;
        }
        items
            .into_iter()
            .filter(|item| self.contains(date_of(item), now))
            .collect()
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TimeRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeRange::ALL_RANGES
            .into_iter()
            .find(|range| range.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownTimeRange(s.to_string()))
    }
}

fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    day.and_hms_opt(0, 0, 0)
        .unwrap_or_default()
        .and_utc()
}

/// Date range passed to the leaderboard procedures
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    /// ISO start date
    pub start_date: String,
    /// ISO end date (inclusive)
    pub end_date: String,
}

impl DateWindow {
    /// Thirty days ending yesterday, in UTC calendar days
    pub fn ending_yesterday(today: NaiveDate) -> Self {
        let end = today - Duration::days(1);
        let start = end - Duration::days(LEADERBOARD_WINDOW_DAYS);
        Self {
            start_date: format_date(start),
            end_date: format_date(end),
        }
    }

    /// Leaderboard window for the current instant
    pub fn current(now: DateTime<Utc>) -> Self {
        Self::ending_yesterday(now.date_naive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn noon(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_labels() {
        assert_eq!("30d".parse::<TimeRange>().unwrap(), TimeRange::Days30);
        assert_eq!("90D".parse::<TimeRange>().unwrap(), TimeRange::Days90);
        assert_eq!("1y".parse::<TimeRange>().unwrap(), TimeRange::Year);
        assert_eq!("all".parse::<TimeRange>().unwrap(), TimeRange::All);
        assert_eq!("All".parse::<TimeRange>().unwrap(), TimeRange::All);
        assert!("7d".parse::<TimeRange>().is_err());
    }

    #[test]
    fn test_all_has_no_cutoff() {
        let now = noon(2024, 6, 30);
        assert_eq!(TimeRange::All.cutoff(now), None);
        assert!(TimeRange::All.contains("1999-01-01", now));
    }

    #[test]
    fn test_cutoff_is_relative_to_wall_clock() {
        let now = noon(2024, 6, 30);
        // cutoff = 2024-05-31T12:00Z, so midnight of 05-31 falls outside
        assert!(!TimeRange::Days30.contains("2024-05-31", now));
        assert!(TimeRange::Days30.contains("2024-06-01", now));
        assert!(TimeRange::Days30.contains("2024-06-30", now));
    }

    #[test]
    fn test_midnight_now_includes_boundary_day() {
        let now = Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap();
        assert!(TimeRange::Days30.contains("2024-05-31", now));
        assert!(!TimeRange::Days30.contains("2024-05-30", now));
    }

    #[test]
    fn test_filter_keeps_suffix() {
        let now = noon(2024, 6, 30);
        let dates = vec!["2023-01-01", "2024-04-15", "2024-06-10", "2024-06-29"];
        let kept = TimeRange::Days90.filter(dates.clone(), now, |d| *d);
        assert_eq!(kept, vec!["2024-04-15", "2024-06-10", "2024-06-29"]);
        assert_eq!(TimeRange::All.filter(dates.clone(), now, |d| *d), dates);
    }

    #[test]
    fn test_leaderboard_window() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let window = DateWindow::ending_yesterday(today);
        assert_eq!(window.end_date, "2024-02-29");
        assert_eq!(window.start_date, "2024-01-30");
    }
}
