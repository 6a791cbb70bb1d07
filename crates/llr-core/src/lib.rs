//! # llr-core — Foundational Types for LLR Desk
//!
//! The leaf crate of the workspace. Defines the primitives every other crate
//! builds on:
//!
//! 1. **Calendar arithmetic.** License validity is expressed in calendar
//!    days and calendar months, not fixed durations. [`calendar`] owns the
//!    single definition of "plus 30 days" and "plus 6 months" so the
//!    workflow engine and its tests agree on month-end behaviour.
//!
//! 2. **Identifier newtypes.** `TaskId` and `UserId` wrap UUIDs so a user id
//!    can never be passed where a task id is expected. Parsing from
//!    untrusted input goes through [`TaskId::parse`] / [`UserId::parse`].
//!
//! 3. **Wall-clock stamps.** [`CalendarStamp`] splits an instant into the
//!    `YYYY-MM-DD` date and `HH:MM:SS` time recorded on audit entries.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `llr-*` crates.
//! - No `.unwrap()` outside tests.

pub mod calendar;
pub mod error;
pub mod identity;

pub use calendar::{add_days, add_months, CalendarStamp};
pub use error::{CalendarError, IdentifierError};
pub use identity::{TaskId, UserId};
