//! # Calendar Arithmetic
//!
//! Date derivation for learner's licenses. A license issued on `D`
//! matures on `D + 30 days` and expires on `D + 6 months`.
//!
//! ## Month-end rule
//!
//! Month addition keeps the day-of-month when the target month has it and
//! otherwise clamps to the last day of the target month:
//!
//! ```text
//! 2024-01-31 + 6 months = 2024-07-31
//! 2024-08-31 + 6 months = 2025-02-28
//! 2023-08-31 + 6 months = 2024-02-29   (leap year)
//! ```
//!
//! Clamping never spills into the following month, so expiry is always in
//! the calendar month six months after issuance.

use chrono::{Days, Months, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::CalendarError;

/// Add a number of calendar days to a date.
pub fn add_days(date: NaiveDate, days: u32) -> Result<NaiveDate, CalendarError> {
    date.checked_add_days(Days::new(u64::from(days)))
        .ok_or_else(|| CalendarError::DaysOutOfRange {
            date: date.to_string(),
            days,
        })
}

/// Add a number of calendar months to a date, clamping the day-of-month
/// to the end of a shorter target month.
pub fn add_months(date: NaiveDate, months: u32) -> Result<NaiveDate, CalendarError> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| CalendarError::MonthsOutOfRange {
            date: date.to_string(),
            months,
        })
}

/// A wall-clock instant split into the date and the time of day, truncated
/// to whole seconds.
///
/// Serializes as `{"date": "2024-01-31", "time": "09:15:00"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CalendarStamp {
    /// Calendar date.
    pub date: NaiveDate,
    /// Time of day, seconds precision.
    pub time: NaiveTime,
}

impl CalendarStamp {
    /// Split a naive date-time, discarding sub-second precision.
    pub fn from_naive(at: NaiveDateTime) -> Self {
        let time = at.time();
        Self {
            date: at.date(),
            time: time.with_nanosecond(0).unwrap_or(time),
        }
    }

    /// Stamp for the current UTC instant.
    pub fn now_utc() -> Self {
        Self::from_naive(chrono::Utc::now().naive_utc())
    }
}

impl std::fmt::Display for CalendarStamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.date, self.time.format("%H:%M:%S"))
    }
}
