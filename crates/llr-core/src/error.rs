//! # Error Types
//!
//! Errors raised by the foundational types. All use `thiserror`; higher
//! crates wrap them in their own enums via `#[from]`.

use thiserror::Error;

/// Calendar arithmetic left the range chrono can represent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    /// Adding days overflowed the representable date range.
    #[error("date {date} plus {days} days is out of range")]
    DaysOutOfRange {
        /// Start date (ISO 8601).
        date: String,
        /// Days added.
        days: u32,
    },

    /// Adding months overflowed the representable date range.
    #[error("date {date} plus {months} months is out of range")]
    MonthsOutOfRange {
        /// Start date (ISO 8601).
        date: String,
        /// Months added.
        months: u32,
    },
}

/// An identifier could not be parsed from untrusted input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    /// The input is not a valid UUID.
    #[error("invalid {kind} id {input:?}")]
    Malformed {
        /// Which identifier namespace was being parsed.
        kind: &'static str,
        /// The rejected input.
        input: String,
    },
}
