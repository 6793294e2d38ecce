//! Fiscal period labels.
//!
//! A period is one calendar year. Its label is the 4-digit year as a string,
//! so lexical and numeric ordering agree.

use std::{fmt, str::FromStr};

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine};

const MIN_YEAR: i32 = 1900;
const MAX_YEAR: i32 = 9998;

/// A validated fiscal year.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct PeriodYear(i32);

impl PeriodYear {
    pub fn new(year: i32) -> ResultEngine<Self> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(EngineError::InvalidPeriod(format!(
                "year must be within {MIN_YEAR}..={MAX_YEAR}, got {year}"
            )));
        }
        Ok(Self(year))
    }

    pub fn value(self) -> i32 {
        self.0
    }

    /// Stored period label (`"2024"`).
    pub fn label(self) -> String {
        format!("{:04}", self.0)
    }

    pub fn previous(self) -> ResultEngine<Self> {
        Self::new(self.0 - 1)
    }

    /// Inclusive start of the period (Jan 1, 00:00:00 UTC).
    pub fn start(self) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(self.0, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Exclusive end of the period (Jan 1 of the following year).
    pub fn end_exclusive(self) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(self.0 + 1, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Last second of the period (Dec 31, 23:59:59 UTC), as persisted in
    /// `end_time`.
    pub fn end_inclusive(self) -> DateTime<Utc> {
        self.end_exclusive() - chrono::Duration::seconds(1)
    }

    /// Years from `self` to `last`, inclusive.
    pub fn through(self, last: PeriodYear) -> impl Iterator<Item = PeriodYear> {
        (self.0..=last.0).map(PeriodYear)
    }
}

impl fmt::Display for PeriodYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.0)
    }
}

impl TryFrom<i32> for PeriodYear {
    type Error = EngineError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PeriodYear> for i32 {
    fn from(value: PeriodYear) -> Self {
        value.0
    }
}

impl FromStr for PeriodYear {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.len() != 4 || !trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Err(EngineError::InvalidPeriod(format!(
                "period must be a 4-digit year, got {s:?}"
            )));
        }
        let year: i32 = trimmed
            .parse()
            .map_err(|_| EngineError::InvalidPeriod(format!("invalid year: {s}")))?;
        Self::new(year)
    }
}
