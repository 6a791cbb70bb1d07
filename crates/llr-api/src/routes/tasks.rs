//! # License Tasks API
//!
//! Routes:
//! - POST   /api/tasks — create a task
//! - GET    /api/tasks — list open tasks, filtered, newest first
//! - GET    /api/check-tasks — abbreviated summaries, closed tasks included
//! - GET    /api/tasks/{id} — fetch one task
//! - PUT    /api/tasks/{id}/status — status transition
//! - PUT    /api/tasks/{id} — partial field edit
//! - DELETE /api/tasks/{id} — delete a task
//! - GET    /api/tasks/{id}/report — task details with history
//!
//! Handlers validate input, then delegate to the workflow engine inside
//! [`TaskStore::mutate`](crate::store::TaskStore::mutate). Changes are
//! stamped with the server's local clock and attributed to `System`.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Utc};
use llr_core::TaskId;
use llr_state::{
    summarize, FieldEdits, IssuedDates, LicenseTask, NewTask, StatusChange, StatusEvent,
    TaskFilter, TaskSummary, SYSTEM_ACTOR,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::{
    check_len, extract_validated_json, parse_task_id, Validate, MAX_FIELD_LEN, MAX_NOTES_LEN,
};
use crate::middleware::metrics::record_transition;
use crate::routes::MessageResponse;
use crate::state::AppState;

// -- Request and response types ----------------------------------------------

/// Request to create a license task.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub applicant_name: String,
    #[serde(default)]
    pub father_name: String,
    /// Date of birth as entered at the counter.
    #[serde(default)]
    pub dob: String,
    #[serde(default)]
    pub mobile: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub reference: String,
    /// One or more vehicle classes, e.g. `["MCWG", "LMV"]`.
    pub vehicle_class: Vec<String>,
    #[serde(default)]
    pub license_type: String,
    #[serde(default)]
    pub declared_payment: f64,
    #[serde(default)]
    pub advance_payment: f64,
    /// Defaults to the authenticated caller, when there is one.
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub notes: String,
}

impl Validate for CreateTaskRequest {
    fn validate(&self) -> Result<(), String> {
        if self.applicant_name.trim().is_empty() {
            return Err("applicantName is required".to_string());
        }
        if self.vehicle_class.iter().all(|c| c.trim().is_empty()) {
            return Err("vehicleClass must name at least one class".to_string());
        }
        for (field, amount) in [
            ("declaredPayment", self.declared_payment),
            ("advancePayment", self.advance_payment),
        ] {
            if !amount.is_finite() || amount < 0.0 {
                return Err(format!("{field} must be a non-negative amount"));
            }
        }
        for (field, value) in [
            ("applicantName", &self.applicant_name),
            ("fatherName", &self.father_name),
            ("dob", &self.dob),
            ("mobile", &self.mobile),
            ("email", &self.email),
            ("reference", &self.reference),
            ("licenseType", &self.license_type),
            ("createdBy", &self.created_by),
        ] {
            check_len(field, value, MAX_FIELD_LEN)?;
        }
        check_len("notes", &self.notes, MAX_NOTES_LEN)?;
        Ok(())
    }
}

/// Request to move a task to another status.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateRequest {
    pub status: String,
    /// Recorded with `Application Generated` and `LLR Issued`.
    pub application_number: Option<String>,
    pub notes: Option<String>,
}

impl Validate for StatusUpdateRequest {
    fn validate(&self) -> Result<(), String> {
        if self.status.trim().is_empty() {
            return Err("status is required".to_string());
        }
        if let Some(number) = &self.application_number {
            check_len("applicationNumber", number, MAX_FIELD_LEN)?;
        }
        if let Some(notes) = &self.notes {
            check_len("notes", notes, MAX_NOTES_LEN)?;
        }
        Ok(())
    }
}

/// Partial update of applicant fields. Omitted or blank fields are kept.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EditTaskRequest {
    pub applicant_name: Option<String>,
    pub mobile: Option<String>,
    pub vehicle_class: Option<Vec<String>>,
    pub notes: Option<String>,
}

impl Validate for EditTaskRequest {
    fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.applicant_name {
            check_len("applicantName", name, MAX_FIELD_LEN)?;
        }
        if let Some(mobile) = &self.mobile {
            check_len("mobile", mobile, MAX_FIELD_LEN)?;
        }
        if let Some(notes) = &self.notes {
            check_len("notes", notes, MAX_NOTES_LEN)?;
        }
        Ok(())
    }
}

impl From<EditTaskRequest> for FieldEdits {
    fn from(req: EditTaskRequest) -> Self {
        Self {
            applicant_name: req.applicant_name,
            mobile: req.mobile,
            vehicle_class: req.vehicle_class,
            notes: req.notes,
        }
    }
}

/// List filters.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListTasksQuery {
    /// Substring of applicant name, mobile or application number.
    pub search: Option<String>,
    /// Exact status. When absent, `LLR Issued` and `Returned` tasks are hidden.
    pub status: Option<String>,
    /// Vehicle class the task must include.
    pub vehicle_class: Option<String>,
}

impl From<ListTasksQuery> for TaskFilter {
    fn from(q: ListTasksQuery) -> Self {
        Self {
            search: q.search,
            status: q.status,
            vehicle_class: q.vehicle_class,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CheckTasksQuery {
    pub search: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TaskResponse {
    pub message: String,
    #[schema(value_type = Object)]
    pub task: LicenseTask,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusUpdateResponse {
    pub message: String,
    #[schema(value_type = Object)]
    pub task: LicenseTask,
    /// Derived LLR dates, present for the `LLR Issued` transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub dates: Option<IssuedDates>,
}

/// Task fields without the history, plus the outstanding balance.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskDetails {
    #[schema(value_type = String)]
    pub id: TaskId,
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
    pub balance_due: f64,
    pub status: String,
    pub application_number: Option<String>,
    #[schema(value_type = Option<String>, format = Date)]
    pub llr_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = Date)]
    pub maturity_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = Date)]
    pub expiry_date: Option<NaiveDate>,
    pub created_by: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&LicenseTask> for TaskDetails {
    fn from(task: &LicenseTask) -> Self {
        let dates = task.issued_dates();
        Self {
            id: task.id(),
            applicant_name: task.applicant_name.clone(),
            father_name: task.father_name.clone(),
            dob: task.dob.clone(),
            mobile: task.mobile.clone(),
            email: task.email.clone(),
            reference: task.reference.clone(),
            vehicle_class: task.vehicle_class.clone(),
            license_type: task.license_type.clone(),
            declared_payment: task.declared_payment,
            advance_payment: task.advance_payment,
            balance_due: task.balance_due(),
            status: task.status().to_string(),
            application_number: task.application_number().map(str::to_string),
            llr_date: dates.map(|d| d.llr_date),
            maturity_date: dates.map(|d| d.maturity_date),
            expiry_date: dates.map(|d| d.expiry_date),
            created_by: task.created_by.clone(),
            notes: task.notes.clone(),
            created_at: task.created_at(),
            updated_at: task.updated_at(),
        }
    }
}

/// Printable report for one task.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskReport {
    pub task_details: TaskDetails,
    #[schema(value_type = Vec<Object>)]
    pub status_history: Vec<StatusEvent>,
    /// Payment ledger. Not tracked yet; always empty.
    #[schema(value_type = Vec<Object>)]
    pub payments: Vec<serde_json::Value>,
    /// Intimation letters. Not tracked yet; always empty.
    #[schema(value_type = Vec<Object>)]
    pub intimations: Vec<serde_json::Value>,
}

impl From<&LicenseTask> for TaskReport {
    fn from(task: &LicenseTask) -> Self {
        Self {
            task_details: TaskDetails::from(task),
            status_history: task.history().to_vec(),
            payments: Vec::new(),
            intimations: Vec::new(),
        }
    }
}

// -- Router -------------------------------------------------------------------

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/check-tasks", get(check_tasks))
        .route(
            "/api/tasks/{id}",
            get(get_task).put(edit_task).delete(delete_task),
        )
        .route("/api/tasks/{id}/status", put(update_status))
        .route("/api/tasks/{id}/report", get(task_report))
}

/// Instant used to stamp history entries and derive LLR dates.
fn change_instant() -> NaiveDateTime {
    Local::now().naive_local()
}

fn find_task(state: &AppState, raw_id: &str) -> Result<LicenseTask, AppError> {
    let id = parse_task_id(raw_id)?;
    state
        .tasks
        .get(id)
        .ok_or_else(|| AppError::NotFound("Task not found".to_string()))
}

// -- Handlers -----------------------------------------------------------------

/// POST /api/tasks — Create a task in `New Application`.
#[utoipa::path(
    post,
    path = "/api/tasks",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created"),
        (status = 400, description = "Invalid task fields", body = crate::error::ErrorBody),
    ),
    tag = "tasks"
)]
pub async fn create_task(
    State(state): State<AppState>,
    caller: Option<CallerIdentity>,
    body: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LicenseTask>), AppError> {
    let req = extract_validated_json(body)?;

    let created_by = match (req.created_by.trim(), caller) {
        ("", Some(caller)) => caller.username,
        (given, _) => given.to_string(),
    };
    let fields = NewTask {
        applicant_name: req.applicant_name.trim().to_string(),
        father_name: req.father_name,
        dob: req.dob,
        mobile: req.mobile.trim().to_string(),
        email: req.email,
        reference: req.reference,
        vehicle_class: req
            .vehicle_class
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect(),
        license_type: req.license_type,
        declared_payment: req.declared_payment,
        advance_payment: req.advance_payment,
        created_by,
        notes: req.notes,
    };

    let task = state.tasks.insert(LicenseTask::new(fields, Utc::now())).await?;
    tracing::info!(task_id = %task.id(), "task created");
    Ok((StatusCode::CREATED, Json(task)))
}

/// GET /api/tasks — List tasks, newest first.
#[utoipa::path(
    get,
    path = "/api/tasks",
    params(ListTasksQuery),
    responses((status = 200, description = "Matching tasks, newest first")),
    tag = "tasks"
)]
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<ListTasksQuery>,
) -> Json<Vec<LicenseTask>> {
    let filter = TaskFilter::from(query);
    Json(filter.apply(state.tasks.list()))
}

/// GET /api/check-tasks — Abbreviated task summaries.
#[utoipa::path(
    get,
    path = "/api/check-tasks",
    params(CheckTasksQuery),
    responses((status = 200, description = "Task summaries, newest first")),
    tag = "tasks"
)]
pub async fn check_tasks(
    State(state): State<AppState>,
    Query(query): Query<CheckTasksQuery>,
) -> Json<Vec<TaskSummary>> {
    Json(summarize(state.tasks.list(), query.search.as_deref()))
}

/// GET /api/tasks/{id} — Fetch a task.
#[utoipa::path(
    get,
    path = "/api/tasks/{id}",
    params(("id" = String, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task found"),
        (status = 400, description = "Malformed task ID", body = crate::error::ErrorBody),
        (status = 404, description = "Task not found", body = crate::error::ErrorBody),
    ),
    tag = "tasks"
)]
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LicenseTask>, AppError> {
    find_task(&state, &id).map(Json)
}

/// PUT /api/tasks/{id}/status — Move a task to another status.
#[utoipa::path(
    put,
    path = "/api/tasks/{id}/status",
    params(("id" = String, Path, description = "Task ID")),
    request_body = StatusUpdateRequest,
    responses(
        (status = 200, description = "Status updated", body = StatusUpdateResponse),
        (status = 400, description = "Rejected transition", body = crate::error::ErrorBody),
        (status = 404, description = "Task not found", body = crate::error::ErrorBody),
        (status = 409, description = "Concurrent update", body = crate::error::ErrorBody),
    ),
    tag = "tasks"
)]
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<StatusUpdateRequest>, JsonRejection>,
) -> Result<Json<StatusUpdateResponse>, AppError> {
    let id = parse_task_id(&id)?;
    let req = extract_validated_json(body)?;
    let change = StatusChange {
        status: req.status,
        application_number: req.application_number,
        notes: req.notes,
        updated_by: SYSTEM_ACTOR.to_string(),
    };

    let engine = &state.workflow;
    let at = change_instant();
    let (task, outcome) = state
        .tasks
        .mutate(id, |task| {
            engine
                .apply_status_change(task, change, at)
                .map_err(AppError::from)
        })
        .await
        .inspect_err(|e| tracing::info!(task_id = %id, error = %e, "status change rejected"))?;

    record_transition(&outcome.status);
    tracing::info!(
        task_id = %id,
        from = %outcome.previous_status,
        to = %outcome.status,
        "task status updated"
    );

    Ok(Json(StatusUpdateResponse {
        message: "Status updated successfully".to_string(),
        task,
        dates: outcome.issued,
    }))
}

/// PUT /api/tasks/{id} — Edit applicant fields.
#[utoipa::path(
    put,
    path = "/api/tasks/{id}",
    params(("id" = String, Path, description = "Task ID")),
    request_body = EditTaskRequest,
    responses(
        (status = 200, description = "Task updated", body = TaskResponse),
        (status = 400, description = "Invalid fields", body = crate::error::ErrorBody),
        (status = 404, description = "Task not found", body = crate::error::ErrorBody),
        (status = 409, description = "Concurrent update", body = crate::error::ErrorBody),
    ),
    tag = "tasks"
)]
pub async fn edit_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<EditTaskRequest>, JsonRejection>,
) -> Result<Json<TaskResponse>, AppError> {
    let id = parse_task_id(&id)?;
    let edits = FieldEdits::from(extract_validated_json(body)?);

    let engine = &state.workflow;
    let at = change_instant();
    let (task, outcome) = state
        .tasks
        .mutate(id, |task| {
            Ok::<_, AppError>(engine.edit_fields(task, edits, SYSTEM_ACTOR, at))
        })
        .await?;

    tracing::info!(task_id = %id, changed = ?outcome.changed, "task fields edited");
    Ok(Json(TaskResponse {
        message: "Task updated successfully".to_string(),
        task,
    }))
}

/// DELETE /api/tasks/{id} — Delete a task.
#[utoipa::path(
    delete,
    path = "/api/tasks/{id}",
    params(("id" = String, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task deleted", body = MessageResponse),
        (status = 400, description = "Malformed task ID", body = crate::error::ErrorBody),
        (status = 404, description = "Task not found", body = crate::error::ErrorBody),
    ),
    tag = "tasks"
)]
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_task_id(&id)?;
    state.tasks.delete(id).await?;
    tracing::info!(task_id = %id, "task deleted");
    Ok(Json(MessageResponse {
        message: "Task deleted successfully".to_string(),
    }))
}

/// GET /api/tasks/{id}/report — Task details with full history.
#[utoipa::path(
    get,
    path = "/api/tasks/{id}/report",
    params(("id" = String, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task report", body = TaskReport),
        (status = 400, description = "Malformed task ID", body = crate::error::ErrorBody),
        (status = 404, description = "Task not found", body = crate::error::ErrorBody),
    ),
    tag = "tasks"
)]
pub async fn task_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TaskReport>, AppError> {
    let task = find_task(&state, &id)?;
    Ok(Json(TaskReport::from(&task)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_request(json: &str) -> CreateTaskRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn create_requires_vehicle_class() {
        let req = create_request(r#"{"applicantName":"Asha","vehicleClass":[" "]}"#);
        assert_eq!(
            req.validate().unwrap_err(),
            "vehicleClass must name at least one class"
        );
    }

    #[test]
    fn create_rejects_negative_payment() {
        let req = create_request(
            r#"{"applicantName":"Asha","vehicleClass":["Car"],"advancePayment":-5}"#,
        );
        assert!(req.validate().unwrap_err().contains("advancePayment"));
    }

    #[test]
    fn create_accepts_minimal_body() {
        let req = create_request(r#"{"applicantName":"Asha","vehicleClass":["Car"]}"#);
        assert!(req.validate().is_ok());
        assert_eq!(req.declared_payment, 0.0);
    }

    #[test]
    fn status_request_requires_status() {
        let req: StatusUpdateRequest = serde_json::from_str(r#"{"status":"  "}"#).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn list_query_maps_to_filter() {
        let filter = TaskFilter::from(ListTasksQuery {
            search: Some("ravi".into()),
            status: None,
            vehicle_class: Some("LMV".into()),
        });
        assert_eq!(filter.search.as_deref(), Some("ravi"));
        assert_eq!(filter.vehicle_class.as_deref(), Some("LMV"));
    }

    #[test]
    fn report_details_include_balance_and_omit_history() {
        let task = LicenseTask::new(
            NewTask {
                applicant_name: "Asha".into(),
                vehicle_class: vec!["Car".into()],
                declared_payment: 3000.0,
                advance_payment: 1200.0,
                ..NewTask::default()
            },
            Utc::now(),
        );
        let json = serde_json::to_value(TaskReport::from(&task)).unwrap();
        assert_eq!(json["taskDetails"]["balanceDue"], 1800.0);
        assert!(json["taskDetails"].get("statusHistory").is_none());
        assert_eq!(json["statusHistory"], serde_json::json!([]));
        assert_eq!(json["payments"], serde_json::json!([]));
        assert_eq!(json["intimations"], serde_json::json!([]));
    }
}
