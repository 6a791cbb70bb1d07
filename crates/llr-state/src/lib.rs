//! # llr-state — License Task Model and Status Workflow
//!
//! Owns the license-task record and every rule about how it may change.
//!
//! ## Workflow
//!
//! ```text
//! New Application ──▶ Application Generated ──▶ LLR Issued (terminal)
//!        │                     │
//!        └──────────┬──────────┘
//!                   ▼
//!               Returned (terminal)
//! ```
//!
//! Status names come from a [`StatusCatalog`] (reference data), so the
//! engine does not hard-code an adjacency table. It enforces the two rules
//! that carry data with them:
//!
//! - `Application Generated` records the application number.
//! - `LLR Issued` requires an application number and derives the learner's
//!   license dates (issue, maturity = +30 days, expiry = +6 months) exactly
//!   once.
//!
//! Every change, including plain field edits, appends an immutable
//! [`StatusEvent`] to the task's history.
//!
//! ## Modules
//!
//! - [`catalog`] — status and vehicle-class reference data.
//! - [`task`] — `LicenseTask`, `StatusEvent`, `IssuedDates`.
//! - [`workflow`] — `WorkflowEngine`: status transitions and field edits.
//! - [`query`] — list filtering and abbreviated summaries.

pub mod catalog;
pub mod query;
pub mod task;
pub mod workflow;

pub use catalog::{status, StatusCatalog, VehicleClassCatalog};
pub use query::{summarize, TaskFilter, TaskSummary};
pub use task::{IssuedDates, LicenseTask, NewTask, StatusEvent};
pub use workflow::{
    EditOutcome, FieldEdits, StatusChange, TransitionOutcome, WorkflowEngine, WorkflowError,
    NO_NOTES, SYSTEM_ACTOR,
};
