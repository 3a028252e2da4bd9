//! Consumption time encoding
//!
//! `eaten_ts` is the number of whole minutes between a fixed reference epoch
//! and the moment of consumption. It exists only as a sortable integer;
//! the display strings are formatted from the same moment independently.

use crate::config::{AppConfig, DEFAULT_DATE_FORMAT, DEFAULT_TIME_FORMAT, REFERENCE_EPOCH_SECONDS};
use crate::error::{AppError, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, TimeZone};
use std::fmt::Display;

/// Minutes since `REFERENCE_EPOCH_SECONDS`, floored
pub fn encode<Tz: TimeZone>(moment: &DateTime<Tz>) -> i64 {
    (moment.timestamp() - REFERENCE_EPOCH_SECONDS).div_euclid(60)
}

/// Everything a log row records about when a food was eaten
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EatenAt {
    pub date_eaten: String,
    pub time_eaten: String,
    pub eaten_ts: i64,
}

/// Validated chrono format strings for the display columns
#[derive(Debug, Clone)]
pub struct DisplayFormat {
    date: String,
    time: String,
}

impl Default for DisplayFormat {
    fn default() -> Self {
        Self {
            date: DEFAULT_DATE_FORMAT.to_string(),
            time: DEFAULT_TIME_FORMAT.to_string(),
        }
    }
}

impl DisplayFormat {
    pub fn new(date: &str, time: &str) -> Result<Self> {
        check_format(date)?;
        check_format(time)?;
        Ok(Self {
            date: date.to_string(),
            time: time.to_string(),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(&config.date_format, &config.time_format)
    }

    /// Display strings in the moment's own timezone, plus the encoded minute
    pub fn stamp<Tz>(&self, moment: &DateTime<Tz>) -> EatenAt
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        EatenAt {
            date_eaten: moment.format(&self.date).to_string(),
            time_eaten: moment.format(&self.time).to_string(),
            eaten_ts: encode(moment),
        }
    }
}

// Formatting an invalid specifier panics inside `to_string`, so reject it up front.
fn check_format(format: &str) -> Result<()> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(AppError::InvalidArgument(format!(
            "invalid date/time format: {}",
            format
        )));
    }
    Ok(())
}
