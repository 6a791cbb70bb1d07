//! # Workflow Properties
//!
//! Drives random sequences of transitions and edits through the engine and
//! checks the history and date invariants after every step.

use chrono::{NaiveDate, NaiveDateTime, TimeZone, Utc};
use llr_state::{
    status, FieldEdits, LicenseTask, NewTask, StatusChange, WorkflowEngine, SYSTEM_ACTOR,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Transition {
        status: &'static str,
        number: Option<String>,
    },
    Edit {
        mobile: Option<String>,
    },
}

fn op() -> impl Strategy<Value = Op> {
    let statuses = prop::sample::select(vec![
        status::NEW_APPLICATION,
        status::APPLICATION_GENERATED,
        status::LLR_ISSUED,
        status::RETURNED,
        "Unknown Status",
    ]);
    prop_oneof![
        (statuses, prop::option::of("[A-Z]{2}[0-9]{3}"))
            .prop_map(|(status, number)| Op::Transition { status, number }),
        prop::option::of("9[0-9]{9}").prop_map(|mobile| Op::Edit { mobile }),
    ]
}

fn fresh_task() -> LicenseTask {
    LicenseTask::new(
        NewTask {
            applicant_name: "Applicant".to_string(),
            mobile: "9000000000".to_string(),
            vehicle_class: vec!["Car".to_string()],
            ..NewTask::default()
        },
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    )
}

fn day(offset: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
        + chrono::Days::new(u64::from(offset))
}

proptest! {
    #[test]
    fn history_only_grows_and_dates_stay_consistent(ops in prop::collection::vec(op(), 1..40)) {
        let engine = WorkflowEngine::default();
        let mut task = fresh_task();

        for (i, op) in ops.into_iter().enumerate() {
            let before = task.clone();
            let at = day(i as u32);
            match op {
                Op::Transition { status, number } => {
                    let result = engine.apply_status_change(
                        &mut task,
                        StatusChange {
                            status: status.to_string(),
                            application_number: number,
                            notes: None,
                            updated_by: SYSTEM_ACTOR.to_string(),
                        },
                        at,
                    );
                    match result {
                        Ok(_) => {
                            prop_assert_eq!(task.history().len(), before.history().len() + 1);
                            prop_assert_eq!(task.status(), status);
                            prop_assert_eq!(&task.history().last().unwrap().status, status);
                        }
                        Err(_) => prop_assert_eq!(&task, &before),
                    }
                }
                Op::Edit { mobile } => {
                    engine.edit_fields(
                        &mut task,
                        FieldEdits { mobile, ..FieldEdits::default() },
                        SYSTEM_ACTOR,
                        at,
                    );
                    prop_assert_eq!(task.history().len(), before.history().len() + 1);
                    prop_assert_eq!(task.status(), before.status());
                }
            }

            // Earlier entries are never rewritten.
            prop_assert_eq!(&task.history()[..before.history().len()], before.history());

            // LLR dates are all-or-nothing and fixed once set.
            if let Some(dates) = before.issued_dates() {
                prop_assert_eq!(task.issued_dates(), Some(dates));
            }
            if let Some(dates) = task.issued_dates() {
                prop_assert_eq!((dates.maturity_date - dates.llr_date).num_days(), 30);
                prop_assert!(task.application_number().is_some());
            }
        }
    }
}
