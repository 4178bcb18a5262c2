//! Calendar fields for date features and cyclical encodings

use crate::{MathError, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

/// Calendar unit that supports a sine/cosine encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarUnit {
    /// Day of the year, cycle of 366
    Day,
    /// ISO week number, cycle of 52
    Week,
    /// Month of the year, cycle of 12
    Month,
}

impl CalendarUnit {
    pub const ALL: [CalendarUnit; 3] = [CalendarUnit::Day, CalendarUnit::Week, CalendarUnit::Month];

    pub fn name(&self) -> &'static str {
        match self {
            CalendarUnit::Day => "day",
            CalendarUnit::Week => "week",
            CalendarUnit::Month => "month",
        }
    }

    /// Length of one full cycle of the unit
    pub fn cycle_length(&self) -> u32 {
        match self {
            CalendarUnit::Day => 366,
            CalendarUnit::Week => 52,
            CalendarUnit::Month => 12,
        }
    }

    /// Calendar value of `date` for this unit
    pub fn value(&self, date: NaiveDate) -> u32 {
        match self {
            CalendarUnit::Day => date.ordinal(),
            CalendarUnit::Week => date.iso_week().week(),
            CalendarUnit::Month => date.month(),
        }
    }

    /// `(sin, cos)` of the unit value mapped onto the circle
    pub fn encode(&self, date: NaiveDate) -> (f64, f64) {
        cyclical(f64::from(self.value(date)), f64::from(self.cycle_length()))
    }
}

impl fmt::Display for CalendarUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CalendarUnit {
    type Err = MathError;

    fn from_str(s: &str) -> Result<Self> {
        CalendarUnit::ALL
            .into_iter()
            .find(|unit| unit.name() == s)
            .ok_or_else(|| MathError::UnsupportedUnit(s.to_string()))
    }
}

/// Sine/cosine pair of `value` on a cycle of length `cycle`
pub fn cyclical(value: f64, cycle: f64) -> (f64, f64) {
    let angle = 2.0 * PI * value / cycle;
    (angle.sin(), angle.cos())
}

/// Date-derived predictor fed to the regressor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateFeature {
    /// Monday = 0 through Sunday = 6
    DayOfWeek,
    /// 1-based day of the year
    DayOfYear,
    /// ISO week number
    Week,
}

impl DateFeature {
    pub fn name(&self) -> &'static str {
        match self {
            DateFeature::DayOfWeek => "dayofweek",
            DateFeature::DayOfYear => "dayofyear",
            DateFeature::Week => "week",
        }
    }

    pub fn value(&self, date: NaiveDate) -> f64 {
        let value = match self {
            DateFeature::DayOfWeek => date.weekday().num_days_from_monday(),
            DateFeature::DayOfYear => date.ordinal(),
            DateFeature::Week => date.iso_week().week(),
        };
        f64::from(value)
    }
}
