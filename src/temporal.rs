//! Dates as they appear in metadata documents.
//!
//! A metadata date often carries less precision than a calendar date: a
//! survey "in 2003" or "during April 2003". [`TemporalValue`] keeps exactly the
//! precision found in the source text, so a year never pretends to have a
//! month or a day.

// used for calendar validation and timestamps
use chrono::{Datelike, NaiveDate, NaiveDateTime};
// used to print out readable forms of a temporal value
use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Serialize, Serializer};

use crate::error::{MedinError, Result};

lazy_static! {
    static ref PARTIAL_DATE: Regex = Regex::new(r"^(\d{4})(?:-(\d{2})(?:-(\d{2}))?)?$").unwrap();
}

const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];

#[derive(Eq, PartialEq, PartialOrd, Ord, Debug, Hash, Clone, Copy)]
pub enum Precision {
    Year,
    Month,
    Day,
}

#[derive(Eq, PartialEq, Debug, Hash, Clone, Copy)]
pub enum TemporalValue {
    Year(i32),
    YearMonth(i32, u32),
    Date(NaiveDate),
}

impl TemporalValue {
    pub fn precision(&self) -> Precision {
        match self {
            TemporalValue::Year(_) => Precision::Year,
            TemporalValue::YearMonth(..) => Precision::Month,
            TemporalValue::Date(_) => Precision::Day,
        }
    }
    pub fn year(&self) -> i32 {
        match self {
            TemporalValue::Year(y) | TemporalValue::YearMonth(y, _) => *y,
            TemporalValue::Date(d) => d.year(),
        }
    }
    /// The month, only when the source text specified one.
    pub fn month(&self) -> Option<u32> {
        match self {
            TemporalValue::Year(_) => None,
            TemporalValue::YearMonth(_, m) => Some(*m),
            TemporalValue::Date(d) => Some(d.month()),
        }
    }
    /// The day, only when the source text specified one.
    pub fn day(&self) -> Option<u32> {
        match self {
            TemporalValue::Date(d) => Some(d.day()),
            _ => None,
        }
    }
}

impl fmt::Display for TemporalValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TemporalValue::Year(y) => write!(f, "{:04}", y),
            TemporalValue::YearMonth(y, m) => write!(f, "{:04}-{:02}", y, m),
            TemporalValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl Serialize for TemporalValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Parses `YYYY`, `YYYY-MM` or `YYYY-MM-DD` into a value of matching precision.
pub fn parse_date(text: &str) -> Result<TemporalValue> {
    let text = text.trim();
    let invalid = || MedinError::InvalidDate(text.to_string());
    let captures = PARTIAL_DATE.captures(text).ok_or_else(invalid)?;
    let year = captures[1].parse::<i32>().map_err(|_| invalid())?;
    let month = match captures.get(2) {
        Some(m) => m.as_str().parse::<u32>().map_err(|_| invalid())?,
        None => return Ok(TemporalValue::Year(year)),
    };
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }
    match captures.get(3) {
        Some(d) => {
            let day = d.as_str().parse::<u32>().map_err(|_| invalid())?;
            NaiveDate::from_ymd_opt(year, month, day)
                .map(TemporalValue::Date)
                .ok_or_else(invalid)
        }
        None => Ok(TemporalValue::YearMonth(year, month)),
    }
}

/// Parses a `YYYY-MM-DDTHH:MM:SS` timestamp (optionally with fractional seconds).
pub fn parse_datetime(text: &str) -> Result<NaiveDateTime> {
    let text = text.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .ok_or_else(|| MedinError::InvalidDate(text.to_string()))
}

/// Parses either a partial date or a timestamp, truncating a timestamp to its date.
pub fn parse_lenient(text: &str) -> Result<TemporalValue> {
    parse_date(text).or_else(|_| parse_datetime(text).map(|t| TemporalValue::Date(t.date())))
}

/// The metadata date stamp, which is either a (possibly partial) date or a timestamp.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum MetadataDate {
    Date(TemporalValue),
    DateTime(NaiveDateTime),
}

impl fmt::Display for MetadataDate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MetadataDate::Date(d) => write!(f, "{}", d),
            MetadataDate::DateTime(t) => write!(f, "{}", t.format("%Y-%m-%dT%H:%M:%S")),
        }
    }
}

impl Serialize for MetadataDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
