//! # Status Workflow Engine
//!
//! Applies status transitions and field edits to a [`LicenseTask`].
//!
//! Every operation validates first and mutates second: a rejected
//! transition leaves the task untouched, including its history. Both
//! operations append exactly one [`StatusEvent`] on success.
//!
//! The engine never reads the clock. Callers pass the instant of the change
//! so the derived dates are deterministic under test.

use chrono::NaiveDateTime;
use llr_core::{CalendarError, CalendarStamp};
use serde::Serialize;
use thiserror::Error;

use crate::catalog::{status, StatusCatalog};
use crate::task::{IssuedDates, LicenseTask, StatusEvent};

/// Notes recorded when a change carries none.
pub const NO_NOTES: &str = "No notes";

/// Actor recorded by the HTTP layer, which does not propagate caller identity.
pub const SYSTEM_ACTOR: &str = "System";

/// Errors that reject a workflow operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    /// No status was supplied.
    #[error("status is required")]
    BlankStatus,

    /// The requested status is not in the status catalog.
    #[error("unknown status {status:?}")]
    UnknownStatus { status: String },

    /// The requested status is reserved for audit entries.
    #[error("status {status:?} is reserved and cannot be requested")]
    ReservedStatus { status: String },

    /// `LLR Issued` requested on a task without an application number.
    #[error("Application number is required before issuing LLR")]
    MissingApplicationNumber,

    /// `LLR Issued` requested on a task whose license dates are already set.
    #[error("LLR was already issued on {llr_date}")]
    AlreadyIssued { llr_date: String },

    /// Derived dates fell outside the representable calendar.
    #[error("date derivation failed: {0}")]
    Calendar(#[from] CalendarError),
}

/// A requested status transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub status: String,
    pub application_number: Option<String>,
    pub notes: Option<String>,
    pub updated_by: String,
}

/// Result of a successful transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionOutcome {
    pub previous_status: String,
    pub status: String,
    /// Set only for the `LLR Issued` transition.
    pub issued: Option<IssuedDates>,
}

/// A partial update of applicant fields. `None`, blank strings and empty
/// lists leave the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldEdits {
    pub applicant_name: Option<String>,
    pub mobile: Option<String>,
    pub vehicle_class: Option<Vec<String>>,
    pub notes: Option<String>,
}

/// Fields changed by [`WorkflowEngine::edit_fields`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditOutcome {
    pub changed: Vec<&'static str>,
}

/// Applies workflow operations against a status catalog.
#[derive(Debug, Clone)]
pub struct WorkflowEngine {
    catalog: StatusCatalog,
    strict: bool,
}

impl WorkflowEngine {
    /// Create an engine. In strict mode requested statuses must be catalog
    /// members; in permissive mode any non-blank status is accepted.
    pub fn new(catalog: StatusCatalog, strict: bool) -> Self {
        Self { catalog, strict }
    }

    pub fn catalog(&self) -> &StatusCatalog {
        &self.catalog
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Move a task to a new status.
    ///
    /// `Application Generated` and `LLR Issued` record a supplied application
    /// number. `LLR Issued` requires one (supplied now or earlier) and sets
    /// the LLR, maturity and expiry dates from the date of `at`.
    pub fn apply_status_change(
        &self,
        task: &mut LicenseTask,
        change: StatusChange,
        at: NaiveDateTime,
    ) -> Result<TransitionOutcome, WorkflowError> {
        let requested = change.status.trim().to_string();
        self.check_status(&requested)?;

        let supplied_number = non_blank(change.application_number);
        let records_number =
            requested == status::APPLICATION_GENERATED || requested == status::LLR_ISSUED;
        let application_number = match (&supplied_number, records_number) {
            (Some(number), true) => Some(number.clone()),
            _ => task.application_number.clone(),
        };

        let stamp = CalendarStamp::from_naive(at);
        let issued = if requested == status::LLR_ISSUED {
            if application_number.as_deref().map_or(true, str::is_empty) {
                return Err(WorkflowError::MissingApplicationNumber);
            }
            if let Some(llr_date) = task.llr_date {
                return Err(WorkflowError::AlreadyIssued {
                    llr_date: llr_date.to_string(),
                });
            }
            Some(IssuedDates::from_issuance(stamp.date)?)
        } else {
            None
        };

        // Validation complete. Mutate.
        let previous_status = std::mem::replace(&mut task.status, requested.clone());
        task.application_number = application_number;
        if let Some(dates) = issued {
            task.llr_date = Some(dates.llr_date);
            task.maturity_date = Some(dates.maturity_date);
            task.expiry_date = Some(dates.expiry_date);
        }
        let event = snapshot(task, &requested, stamp, change.updated_by, change.notes);
        task.status_history.push(event);

        Ok(TransitionOutcome {
            previous_status,
            status: requested,
            issued,
        })
    }

    /// Apply a partial field update and append an `Edited` audit entry.
    ///
    /// The entry is appended even when no field changed.
    pub fn edit_fields(
        &self,
        task: &mut LicenseTask,
        edits: FieldEdits,
        updated_by: impl Into<String>,
        at: NaiveDateTime,
    ) -> EditOutcome {
        let mut changed = Vec::new();

        if let Some(name) = non_blank(edits.applicant_name) {
            task.applicant_name = name;
            changed.push("applicantName");
        }
        if let Some(mobile) = non_blank(edits.mobile) {
            task.mobile = mobile;
            changed.push("mobile");
        }
        if let Some(classes) = edits.vehicle_class {
            let classes: Vec<String> = classes
                .into_iter()
                .filter_map(|c| non_blank(Some(c)))
                .collect();
            if !classes.is_empty() {
                task.vehicle_class = classes;
                changed.push("vehicleClass");
            }
        }
        let notes = non_blank(edits.notes);
        if let Some(notes) = &notes {
            task.notes = notes.clone();
            changed.push("notes");
        }

        let event = snapshot(
            task,
            status::EDITED,
            CalendarStamp::from_naive(at),
            updated_by.into(),
            notes,
        );
        task.status_history.push(event);

        EditOutcome { changed }
    }

    fn check_status(&self, requested: &str) -> Result<(), WorkflowError> {
        if requested.is_empty() {
            return Err(WorkflowError::BlankStatus);
        }
        if requested == status::EDITED {
            return Err(WorkflowError::ReservedStatus {
                status: requested.to_string(),
            });
        }
        if self.strict && !self.catalog.contains(requested) {
            return Err(WorkflowError::UnknownStatus {
                status: requested.to_string(),
            });
        }
        Ok(())
    }
}

impl Default for WorkflowEngine {
    fn default() -> Self {
        Self::new(StatusCatalog::default(), true)
    }
}

fn snapshot(
    task: &LicenseTask,
    status: &str,
    stamp: CalendarStamp,
    updated_by: String,
    notes: Option<String>,
) -> StatusEvent {
    StatusEvent {
        status: status.to_string(),
        date: stamp.date,
        time: stamp.time,
        updated_by,
        application_number: task.application_number.clone(),
        llr_date: task.llr_date,
        maturity_date: task.maturity_date,
        expiry_date: task.expiry_date,
        notes: non_blank(notes).unwrap_or_else(|| NO_NOTES.to_string()),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::NewTask;
    use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_milli_opt(10, 30, 15, 250)
            .unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn make_task() -> LicenseTask {
        LicenseTask::new(
            NewTask {
                applicant_name: "Anita Sharma".to_string(),
                father_name: "Mohan Sharma".to_string(),
                mobile: "9123456780".to_string(),
                vehicle_class: vec!["Car".to_string()],
                notes: "walk-in".to_string(),
                ..NewTask::default()
            },
            Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap(),
        )
    }

    fn change(status: &str, number: Option<&str>, notes: Option<&str>) -> StatusChange {
        StatusChange {
            status: status.to_string(),
            application_number: number.map(str::to_string),
            notes: notes.map(str::to_string),
            updated_by: SYSTEM_ACTOR.to_string(),
        }
    }

    // ── Status transitions ───────────────────────────────────────────

    #[test]
    fn application_generated_records_number() {
        let engine = WorkflowEngine::default();
        let mut task = make_task();
        let outcome = engine
            .apply_status_change(
                &mut task,
                change(status::APPLICATION_GENERATED, Some("AP123"), None),
                at(2024, 1, 20),
            )
            .unwrap();

        assert_eq!(outcome.previous_status, status::NEW_APPLICATION);
        assert_eq!(outcome.status, status::APPLICATION_GENERATED);
        assert!(outcome.issued.is_none());
        assert_eq!(task.status(), status::APPLICATION_GENERATED);
        assert_eq!(task.application_number(), Some("AP123"));
        assert_eq!(task.history().len(), 1);

        let event = &task.history()[0];
        assert_eq!(event.status, status::APPLICATION_GENERATED);
        assert_eq!(event.date, date(2024, 1, 20));
        assert_eq!(event.time, NaiveTime::from_hms_opt(10, 30, 15).unwrap());
        assert_eq!(event.updated_by, "System");
        assert_eq!(event.application_number.as_deref(), Some("AP123"));
        assert_eq!(event.notes, NO_NOTES);
    }

    #[test]
    fn application_number_can_be_overwritten() {
        let engine = WorkflowEngine::default();
        let mut task = make_task();
        for number in ["AP1", "AP2"] {
            engine
                .apply_status_change(
                    &mut task,
                    change(status::APPLICATION_GENERATED, Some(number), None),
                    at(2024, 1, 20),
                )
                .unwrap();
        }
        assert_eq!(task.application_number(), Some("AP2"));
        assert_eq!(task.history().len(), 2);
    }

    #[test]
    fn other_statuses_ignore_supplied_number() {
        let engine = WorkflowEngine::default();
        let mut task = make_task();
        engine
            .apply_status_change(
                &mut task,
                change(status::RETURNED, Some("AP9"), Some("documents missing")),
                at(2024, 1, 20),
            )
            .unwrap();
        assert!(task.application_number().is_none());
        assert_eq!(task.history()[0].notes, "documents missing");
    }

    #[test]
    fn llr_issued_derives_dates() {
        let engine = WorkflowEngine::default();
        let mut task = make_task();
        engine
            .apply_status_change(
                &mut task,
                change(status::APPLICATION_GENERATED, Some("AP123"), None),
                at(2024, 1, 20),
            )
            .unwrap();
        let outcome = engine
            .apply_status_change(&mut task, change(status::LLR_ISSUED, None, None), at(2024, 1, 31))
            .unwrap();

        let issued = outcome.issued.unwrap();
        assert_eq!(issued.llr_date, date(2024, 1, 31));
        assert_eq!(issued.maturity_date, date(2024, 3, 1));
        assert_eq!(issued.expiry_date, date(2024, 7, 31));
        assert_eq!(task.issued_dates(), Some(issued));
        assert_eq!(task.status(), status::LLR_ISSUED);
        assert!(task.is_closed());

        let event = task.history().last().unwrap();
        assert_eq!(event.llr_date, Some(issued.llr_date));
        assert_eq!(event.maturity_date, Some(issued.maturity_date));
        assert_eq!(event.expiry_date, Some(issued.expiry_date));
        assert_eq!(task.history().len(), 2);
    }

    #[test]
    fn llr_issued_accepts_number_in_same_call() {
        let engine = WorkflowEngine::default();
        let mut task = make_task();
        engine
            .apply_status_change(
                &mut task,
                change(status::LLR_ISSUED, Some("AP777"), None),
                at(2024, 8, 31),
            )
            .unwrap();
        assert_eq!(task.application_number(), Some("AP777"));
        assert_eq!(task.issued_dates().unwrap().expiry_date, date(2025, 2, 28));
    }

    #[test]
    fn llr_issued_without_number_is_rejected_and_history_unchanged() {
        let engine = WorkflowEngine::default();
        let mut task = make_task();
        let before = task.clone();

        let err = engine
            .apply_status_change(&mut task, change(status::LLR_ISSUED, Some("  "), None), at(2024, 1, 31))
            .unwrap_err();

        assert_eq!(err, WorkflowError::MissingApplicationNumber);
        assert_eq!(err.to_string(), "Application number is required before issuing LLR");
        assert_eq!(task, before);
    }

    #[test]
    fn llr_dates_are_set_only_once() {
        let engine = WorkflowEngine::default();
        let mut task = make_task();
        engine
            .apply_status_change(&mut task, change(status::LLR_ISSUED, Some("AP1"), None), at(2024, 1, 31))
            .unwrap();
        let before = task.clone();

        let err = engine
            .apply_status_change(&mut task, change(status::LLR_ISSUED, None, None), at(2024, 2, 15))
            .unwrap_err();

        assert!(matches!(err, WorkflowError::AlreadyIssued { .. }));
        assert_eq!(task, before);
    }

    #[test]
    fn strict_engine_rejects_unknown_status() {
        let engine = WorkflowEngine::default();
        let mut task = make_task();
        let err = engine
            .apply_status_change(&mut task, change("Teleported", None, None), at(2024, 1, 31))
            .unwrap_err();
        assert_eq!(
            err,
            WorkflowError::UnknownStatus {
                status: "Teleported".to_string()
            }
        );
        assert!(task.history().is_empty());
    }

    #[test]
    fn permissive_engine_accepts_unknown_status() {
        let engine = WorkflowEngine::new(StatusCatalog::default(), false);
        let mut task = make_task();
        engine
            .apply_status_change(&mut task, change("Slot Booked", None, None), at(2024, 1, 31))
            .unwrap();
        assert_eq!(task.status(), "Slot Booked");
    }

    #[test]
    fn edited_and_blank_statuses_are_rejected_in_any_mode() {
        let engine = WorkflowEngine::new(StatusCatalog::default(), false);
        let mut task = make_task();
        assert!(matches!(
            engine.apply_status_change(&mut task, change("Edited", None, None), at(2024, 1, 31)),
            Err(WorkflowError::ReservedStatus { .. })
        ));
        assert_eq!(
            engine.apply_status_change(&mut task, change("   ", None, None), at(2024, 1, 31)),
            Err(WorkflowError::BlankStatus)
        );
        assert!(task.history().is_empty());
    }

    #[test]
    fn status_is_trimmed_before_lookup() {
        let engine = WorkflowEngine::default();
        let mut task = make_task();
        engine
            .apply_status_change(&mut task, change(" Returned ", None, None), at(2024, 1, 31))
            .unwrap();
        assert_eq!(task.status(), status::RETURNED);
    }

    // ── Field edits ──────────────────────────────────────────────────

    #[test]
    fn edit_applies_only_present_fields() {
        let engine = WorkflowEngine::default();
        let mut task = make_task();
        let outcome = engine.edit_fields(
            &mut task,
            FieldEdits {
                mobile: Some("9000000001".to_string()),
                applicant_name: Some("   ".to_string()),
                vehicle_class: Some(vec![]),
                notes: None,
            },
            SYSTEM_ACTOR,
            at(2024, 1, 21),
        );

        assert_eq!(outcome.changed, vec!["mobile"]);
        assert_eq!(task.mobile, "9000000001");
        assert_eq!(task.applicant_name, "Anita Sharma");
        assert_eq!(task.vehicle_class, vec!["Car"]);
        assert_eq!(task.notes, "walk-in");
        assert_eq!(task.status(), status::NEW_APPLICATION);

        let event = task.history().last().unwrap();
        assert_eq!(event.status, status::EDITED);
        assert_eq!(event.notes, NO_NOTES);
    }

    #[test]
    fn edit_with_notes_records_them() {
        let engine = WorkflowEngine::default();
        let mut task = make_task();
        let outcome = engine.edit_fields(
            &mut task,
            FieldEdits {
                vehicle_class: Some(vec!["MCWG".to_string(), " ".to_string(), "LMV".to_string()]),
                notes: Some("added two-wheeler".to_string()),
                ..FieldEdits::default()
            },
            SYSTEM_ACTOR,
            at(2024, 1, 21),
        );
        assert_eq!(outcome.changed, vec!["vehicleClass", "notes"]);
        assert_eq!(task.vehicle_class, vec!["MCWG", "LMV"]);
        assert_eq!(task.notes, "added two-wheeler");
        assert_eq!(task.history()[0].notes, "added two-wheeler");
    }

    #[test]
    fn empty_edit_still_appends_history() {
        let engine = WorkflowEngine::default();
        let mut task = make_task();
        let outcome = engine.edit_fields(&mut task, FieldEdits::default(), SYSTEM_ACTOR, at(2024, 1, 21));
        assert!(outcome.changed.is_empty());
        assert_eq!(task.history().len(), 1);
    }

    #[test]
    fn repeated_edit_is_idempotent_apart_from_history() {
        let engine = WorkflowEngine::default();
        let edits = FieldEdits {
            applicant_name: Some("Anita S.".to_string()),
            mobile: Some("9000000002".to_string()),
            ..FieldEdits::default()
        };
        let mut task = make_task();
        engine.edit_fields(&mut task, edits.clone(), SYSTEM_ACTOR, at(2024, 1, 21));
        let after_first = task.clone();
        engine.edit_fields(&mut task, edits, SYSTEM_ACTOR, at(2024, 1, 21));

        assert_eq!(task.applicant_name, after_first.applicant_name);
        assert_eq!(task.mobile, after_first.mobile);
        assert_eq!(task.notes, after_first.notes);
        assert_eq!(task.history().len(), 2);
        assert_eq!(task.history()[0], task.history()[1]);
    }

    #[test]
    fn edit_keeps_status_after_issuance() {
        let engine = WorkflowEngine::default();
        let mut task = make_task();
        engine
            .apply_status_change(&mut task, change(status::LLR_ISSUED, Some("AP1"), None), at(2024, 1, 31))
            .unwrap();
        engine.edit_fields(&mut task, FieldEdits::default(), SYSTEM_ACTOR, at(2024, 2, 1));

        assert_eq!(task.status(), status::LLR_ISSUED);
        let edited = task.history().last().unwrap();
        assert_eq!(edited.llr_date, Some(date(2024, 1, 31)));
        assert_eq!(edited.application_number.as_deref(), Some("AP1"));
    }
}
