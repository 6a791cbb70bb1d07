//! # License Task Record
//!
//! One driving-license application, stored as a single document with its
//! full status history embedded.
//!
//! Applicant and financial fields are public. Workflow fields (status,
//! application number, LLR dates, history) are private and change only
//! through [`crate::WorkflowEngine`], which keeps them consistent with the
//! history.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use llr_core::{add_days, add_months, CalendarError, TaskId};
use serde::{Deserialize, Serialize};

use crate::catalog::status;

/// Days from LLR issuance to maturity.
pub const MATURITY_DAYS: u32 = 30;

/// Months from LLR issuance to expiry.
pub const VALIDITY_MONTHS: u32 = 6;

/// The three dates derived when a learner's license is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedDates {
    pub llr_date: NaiveDate,
    pub maturity_date: NaiveDate,
    pub expiry_date: NaiveDate,
}

impl IssuedDates {
    /// Derive maturity and expiry from the issuance date.
    pub fn from_issuance(llr_date: NaiveDate) -> Result<Self, CalendarError> {
        Ok(Self {
            llr_date,
            maturity_date: add_days(llr_date, MATURITY_DAYS)?,
            expiry_date: add_months(llr_date, VALIDITY_MONTHS)?,
        })
    }
}

/// One immutable audit entry in a task's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEvent {
    /// Status recorded by this entry (`Edited` for field edits).
    pub status: String,
    /// Calendar date of the change.
    pub date: NaiveDate,
    /// Time of day of the change, seconds precision.
    pub time: NaiveTime,
    /// Who made the change.
    pub updated_by: String,
    #[serde(default)]
    pub application_number: Option<String>,
    #[serde(default)]
    pub llr_date: Option<NaiveDate>,
    #[serde(default)]
    pub maturity_date: Option<NaiveDate>,
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
    pub notes: String,
}

/// Applicant-supplied fields for a new task.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewTask {
    pub applicant_name: String,
    pub father_name: String,
    pub dob: String,
    pub mobile: String,
    pub email: String,
    pub reference: String,
    pub vehicle_class: Vec<String>,
    pub license_type: String,
    pub declared_payment: f64,
    pub advance_payment: f64,
    pub created_by: String,
    pub notes: String,
}

/// A driving-license application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseTask {
    id: TaskId,
    pub applicant_name: String,
    #[serde(default)]
    pub father_name: String,
    #[serde(default)]
    pub dob: String,
    pub mobile: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub reference: String,
    pub vehicle_class: Vec<String>,
    #[serde(default)]
    pub license_type: String,
    #[serde(default)]
    pub declared_payment: f64,
    #[serde(default)]
    pub advance_payment: f64,
    pub(crate) status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) application_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) llr_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) maturity_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) expiry_date: Option<NaiveDate>,
    #[serde(default)]
    pub(crate) status_history: Vec<StatusEvent>,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub notes: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    /// Commit counter used for compare-and-swap by the store.
    #[serde(default)]
    version: u64,
}

impl LicenseTask {
    /// Create a task in `New Application` with an empty history.
    pub fn new(fields: NewTask, now: DateTime<Utc>) -> Self {
        Self {
            id: TaskId::new(),
            applicant_name: fields.applicant_name,
            father_name: fields.father_name,
            dob: fields.dob,
            mobile: fields.mobile,
            email: fields.email,
            reference: fields.reference,
            vehicle_class: fields.vehicle_class,
            license_type: fields.license_type,
            declared_payment: fields.declared_payment,
            advance_payment: fields.advance_payment,
            status: status::NEW_APPLICATION.to_string(),
            application_number: None,
            llr_date: None,
            maturity_date: None,
            expiry_date: None,
            status_history: Vec::new(),
            created_by: fields.created_by,
            notes: fields.notes,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn application_number(&self) -> Option<&str> {
        self.application_number.as_deref()
    }

    /// The derived LLR dates, present once the license has been issued.
    pub fn issued_dates(&self) -> Option<IssuedDates> {
        match (self.llr_date, self.maturity_date, self.expiry_date) {
            (Some(llr_date), Some(maturity_date), Some(expiry_date)) => Some(IssuedDates {
                llr_date,
                maturity_date,
                expiry_date,
            }),
            _ => None,
        }
    }

    /// Audit history, oldest first.
    pub fn history(&self) -> &[StatusEvent] {
        &self.status_history
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Record a committed mutation: bump the version and the update time.
    pub fn mark_committed(&mut self, at: DateTime<Utc>) {
        self.version += 1;
        self.updated_at = at;
    }

    /// Notes of the most recent history entry, falling back to the task notes.
    pub fn latest_note(&self) -> &str {
        self.status_history
            .last()
            .map(|e| e.notes.as_str())
            .unwrap_or(&self.notes)
    }

    /// Outstanding amount: declared payment less the advance.
    pub fn balance_due(&self) -> f64 {
        self.declared_payment - self.advance_payment
    }

    /// Whether the task has reached a terminal status.
    pub fn is_closed(&self) -> bool {
        status::is_terminal(&self.status)
    }
}
