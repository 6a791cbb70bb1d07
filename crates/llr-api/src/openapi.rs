//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI spec,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "LLR Desk API",
        version = "0.1.0",
        description = "Learner's license application tracking: task intake, status workflow with derived LLR dates, search, reports, and staff accounts.",
        license(name = "AGPL-3.0-or-later")
    ),
    paths(
        // Accounts
        crate::routes::accounts::register,
        crate::routes::accounts::login,
        // Tasks
        crate::routes::tasks::create_task,
        crate::routes::tasks::list_tasks,
        crate::routes::tasks::check_tasks,
        crate::routes::tasks::get_task,
        crate::routes::tasks::update_status,
        crate::routes::tasks::edit_task,
        crate::routes::tasks::delete_task,
        crate::routes::tasks::task_report,
        // Reference data
        crate::routes::catalog::list_statuses,
        crate::routes::catalog::list_vehicle_classes,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::routes::MessageResponse,
        crate::routes::accounts::RegisterRequest,
        crate::routes::accounts::LoginRequest,
        crate::routes::accounts::LoginResponse,
        crate::routes::tasks::CreateTaskRequest,
        crate::routes::tasks::StatusUpdateRequest,
        crate::routes::tasks::StatusUpdateResponse,
        crate::routes::tasks::EditTaskRequest,
        crate::routes::tasks::TaskResponse,
        crate::routes::tasks::TaskDetails,
        crate::routes::tasks::TaskReport,
    )),
    tags(
        (name = "accounts", description = "Registration and login"),
        (name = "tasks", description = "License tasks and the status workflow"),
        (name = "catalog", description = "Statuses and vehicle classes"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json — Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
