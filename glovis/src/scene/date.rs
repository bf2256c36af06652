//! Acquisition dates and date-range predicates.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use thiserror::Error;

/// Errors parsing an acquisition date.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DateError {
    /// The value is not an 8-digit YYYYMMDD number.
    #[error("Invalid acquisition date format: {0}")]
    InvalidFormat(String),

    /// The digits do not name a real calendar day.
    #[error("Acquisition date does not exist: {0}")]
    InvalidDay(u32),
}

/// A scene acquisition date.
///
/// Ordered chronologically; the packed `YYYYMMDD` form sorts the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AcquisitionDate(NaiveDate);

impl AcquisitionDate {
    /// Build from a packed `YYYYMMDD` value.
    pub fn from_yyyymmdd(value: u32) -> Result<Self, DateError> {
        let year = (value / 10_000) as i32;
        let month = (value / 100) % 100;
        let day = value % 100;
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self)
            .ok_or(DateError::InvalidDay(value))
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Packed `YYYYMMDD` form.
    pub fn yyyymmdd(&self) -> u32 {
        self.0.year() as u32 * 10_000 + self.0.month() * 100 + self.0.day()
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// Month, 1 through 12.
    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    /// Day of the year, 1 through 366.
    pub fn julian_day(&self) -> u32 {
        self.0.ordinal()
    }

    pub fn as_naive(&self) -> NaiveDate {
        self.0
    }
}

impl FromStr for AcquisitionDate {
    type Err = DateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DateError::InvalidFormat(s.to_string()));
        }
        let value: u32 = s
            .parse()
            .map_err(|_| DateError::InvalidFormat(s.to_string()))?;
        Self::from_yyyymmdd(value)
    }
}

impl fmt::Display for AcquisitionDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y/%m/%d"))
    }
}

/// Year span plus a month window that may wrap across the year boundary.
///
/// Months are zero-based here (0 = January) to match the values stored in
/// the configuration file; they are shifted to calendar months internally.
/// A window of November (10) through February (1) wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start_year: i32,
    pub end_year: i32,
    pub start_month: u32,
    pub end_month: u32,
}

impl DateRange {
    pub fn new(start_year: i32, end_year: i32, start_month: u32, end_month: u32) -> Self {
        Self {
            start_year,
            end_year,
            start_month,
            end_month,
        }
    }

    /// Every year, every month.
    pub fn unbounded() -> Self {
        Self::new(i32::MIN, i32::MAX, 0, 11)
    }

    /// True if the month window crosses the December/January boundary.
    pub fn wraps(&self) -> bool {
        self.start_month > self.end_month
    }

    /// Month-window test, calendar month 1 through 12.
    pub fn contains_month(&self, month: u32) -> bool {
        let start = self.start_month + 1;
        let end = self.end_month + 1;
        if start <= end {
            month >= start && month <= end
        } else {
            month >= start || month <= end
        }
    }

    pub fn contains(&self, date: AcquisitionDate) -> bool {
        let year = date.year();
        year >= self.start_year && year <= self.end_year && self.contains_month(date.month())
    }
}

impl Default for DateRange {
    fn default() -> Self {
        Self::unbounded()
    }
}
