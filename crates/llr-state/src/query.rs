//! # Task Queries
//!
//! List filtering and the abbreviated summary shown by the quick-check
//! screen. Matching is case-insensitive; results are newest first.

use serde::Serialize;
use llr_core::TaskId;

use crate::catalog::status;
use crate::task::LicenseTask;

/// Criteria for the task list. Blank values count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Substring of applicant name, mobile or application number.
    pub search: Option<String>,
    /// Exact status. When absent, closed tasks are hidden.
    pub status: Option<String>,
    /// Vehicle class the task must include.
    pub vehicle_class: Option<String>,
}

impl TaskFilter {
    /// Whether a task satisfies every criterion.
    pub fn matches(&self, task: &LicenseTask) -> bool {
        let status_ok = match present(&self.status) {
            Some(wanted) => task.status() == wanted,
            None => !status::is_terminal(task.status()),
        };
        let class_ok = present(&self.vehicle_class).map_or(true, |wanted| {
            task.vehicle_class
                .iter()
                .any(|c| c.eq_ignore_ascii_case(wanted))
        });
        status_ok && class_ok && matches_search(task, present(&self.search))
    }

    /// Filter and order tasks newest first.
    pub fn apply(&self, tasks: impl IntoIterator<Item = LicenseTask>) -> Vec<LicenseTask> {
        let mut out: Vec<LicenseTask> = tasks.into_iter().filter(|t| self.matches(t)).collect();
        sort_newest_first(&mut out);
        out
    }
}

/// Abbreviated view of a task for the quick-check screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummary {
    pub id: TaskId,
    pub applicant_name: String,
    pub father_name: String,
    pub mobile: String,
    /// Vehicle classes joined with `", "`.
    pub vehicle_class: String,
    pub application_number: Option<String>,
    pub status: String,
    pub latest_note: String,
}

impl From<&LicenseTask> for TaskSummary {
    fn from(task: &LicenseTask) -> Self {
        Self {
            id: task.id(),
            applicant_name: task.applicant_name.clone(),
            father_name: task.father_name.clone(),
            mobile: task.mobile.clone(),
            vehicle_class: task.vehicle_class.join(", "),
            application_number: task.application_number().map(str::to_string),
            status: task.status().to_string(),
            latest_note: task.latest_note().to_string(),
        }
    }
}

/// Summaries of every task matching `search`, closed tasks included,
/// newest first.
pub fn summarize(tasks: impl IntoIterator<Item = LicenseTask>, search: Option<&str>) -> Vec<TaskSummary> {
    let search = search.map(str::trim).filter(|s| !s.is_empty());
    let mut hits: Vec<LicenseTask> = tasks
        .into_iter()
        .filter(|t| matches_search(t, search))
        .collect();
    sort_newest_first(&mut hits);
    hits.iter().map(TaskSummary::from).collect()
}

fn matches_search(task: &LicenseTask, search: Option<&str>) -> bool {
    let Some(needle) = search else {
        return true;
    };
    let needle = needle.to_lowercase();
    [
        Some(task.applicant_name.as_str()),
        Some(task.mobile.as_str()),
        task.application_number(),
    ]
    .into_iter()
    .flatten()
    .any(|field| field.to_lowercase().contains(&needle))
}

fn sort_newest_first(tasks: &mut [LicenseTask]) {
    tasks.sort_by(|a, b| {
        b.created_at()
            .cmp(&a.created_at())
            .then_with(|| a.id().cmp(&b.id()))
    });
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
