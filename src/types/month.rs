//! Calendar month arithmetic and the fixed monthly calendar every series is aligned to.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// A calendar month, stored as `(year, month)` with `month` in `1..=12`.
///
/// Months are totally ordered and can be shifted by whole months.
///
/// # Examples
///
/// ```
/// use ehyd::Month;
///
/// let dec = Month::new(12, 2021);
/// assert_eq!(dec.offset(1), Month::new(1, 2022));
/// assert_eq!(dec.to_string(), "2021-12");
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct Month(pub i32, pub u32);

impl Month {
    pub fn new(month: u32, year: i32) -> Self {
        Self(year, month)
    }
    pub fn year(self) -> i32 {
        self.0
    }
    pub fn month(self) -> u32 {
        self.1
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.year(), date.month())
    }

    /// The first day of the month, `None` for an out-of-range month number.
    pub fn first_day(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.0, self.1, 1)
    }

    /// Number of months since year 0, used for dense indexing.
    pub fn index(self) -> i64 {
        self.0 as i64 * 12 + (self.1 as i64 - 1)
    }

    pub fn from_index(index: i64) -> Self {
        let year = index.div_euclid(12);
        let month = index.rem_euclid(12) + 1;
        Self(year as i32, month as u32)
    }

    pub fn offset(self, months: i64) -> Self {
        Self::from_index(self.index() + months)
    }

    /// Signed distance in months from `self` to `other`.
    pub fn months_until(self, other: Month) -> i64 {
        other.index() - self.index()
    }
}

impl Display for Month {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.0, self.1)
    }
}

impl FromStr for Month {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| format!("expected YYYY-MM, got '{s}'"))?;
        let year: i32 = year.parse().map_err(|_| format!("invalid year in '{s}'"))?;
        let month: u32 = month.parse().map_err(|_| format!("invalid month in '{s}'"))?;
        if !(1..=12).contains(&month) {
            return Err(format!("month out of range in '{s}'"));
        }
        Ok(Month(year, month))
    }
}

/// An inclusive span of months.
///
/// The default calendar runs from 1960-01 through 2021-12, the period all station
/// series are normalized to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    pub start: Month,
    pub end: Month,
}

impl Default for Calendar {
    fn default() -> Self {
        Self {
            start: Month::new(1, 1960),
            end: Month::new(12, 2021),
        }
    }
}

impl Calendar {
    pub fn new(start: Month, end: Month) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        (self.start.months_until(self.end) + 1).max(0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, month: Month) -> bool {
        self.start <= month && month <= self.end
    }

    /// Position of `month` within the calendar, if it falls inside it.
    pub fn position(&self, month: Month) -> Option<usize> {
        self.contains(month)
            .then(|| self.start.months_until(month) as usize)
    }

    pub fn months(&self) -> impl Iterator<Item = Month> + '_ {
        (0..self.len() as i64).map(|i| self.start.offset(i))
    }
}
