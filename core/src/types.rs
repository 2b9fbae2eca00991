//! Shared primitive types used across the dashboard core.

use crate::error::{YoyError, YoyResult};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A customer's display name. Distinct-customer counts key on this.
pub type CustomerName = String;

/// A sales volume in the dataset's unit (㎥). `None` means "absent", not zero.
pub type Volume = Option<f64>;

/// A calendar month. Always normalised to the first day of the month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SalesMonth(NaiveDate);

impl SalesMonth {
    pub fn new(year: i32, month: u32) -> YoyResult<Self> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(Self)
            .ok_or_else(|| YoyError::InvalidMonth {
                value: format!("{year}-{month}"),
            })
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// The same month one year earlier.
    pub fn prior_year(&self) -> Self {
        Self(self.0.with_year(self.0.year() - 1).unwrap_or(self.0))
    }
}

impl FromStr for SalesMonth {
    type Err = YoyError;

    /// Accepts `YYYY-MM-DD` (day ignored), `YYYY-MM`, `YYYY/MM`, `YYYYMM`,
    /// and a trailing time component as written by spreadsheet exports.
    fn from_str(s: &str) -> YoyResult<Self> {
        let invalid = || YoyError::InvalidMonth { value: s.to_string() };
        let trimmed = s.trim();
        let date_part = trimmed.split([' ', 'T']).next().unwrap_or(trimmed);

        if let Ok(d) = NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
            return Self::new(d.year(), d.month());
        }

        let (year, month) = if let Some((y, m)) = date_part.split_once(['-', '/']) {
            (y, m)
        } else if date_part.len() == 6 && date_part.chars().all(|c| c.is_ascii_digit()) {
            date_part.split_at(4)
        } else {
            return Err(invalid());
        };

        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).map_err(|_| invalid())
    }
}

impl fmt::Display for SalesMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m"))
    }
}

impl Serialize for SalesMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SalesMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_month_layouts() {
        let expected = SalesMonth::new(2024, 3).unwrap();
        for raw in ["2024-03-01", "2024-03", "2024/03", "202403", "2024-03-01 00:00:00", "2024-03-17"] {
            assert_eq!(raw.parse::<SalesMonth>().unwrap(), expected, "layout {raw}");
        }
    }

    #[test]
    fn rejects_garbage_months() {
        for raw in ["", "March", "2024-13", "20241", "2024-00-01"] {
            assert!(raw.parse::<SalesMonth>().is_err(), "should reject {raw:?}");
        }
    }

    #[test]
    fn prior_year_keeps_month() {
        let m = SalesMonth::new(2024, 2).unwrap();
        assert_eq!(m.prior_year(), SalesMonth::new(2023, 2).unwrap());
        assert_eq!(m.to_string(), "2024-02");
    }
}
