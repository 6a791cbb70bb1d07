//! # Reference Data API
//!
//! Routes:
//! - GET /api/statuses — status names, alphabetical
//! - GET /api/vehicle-classes — vehicle class names, alphabetical

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/statuses", get(list_statuses))
        .route("/api/vehicle-classes", get(list_vehicle_classes))
}

/// GET /api/statuses — Status catalog.
#[utoipa::path(
    get,
    path = "/api/statuses",
    responses((status = 200, description = "Status names, alphabetical", body = Vec<String>)),
    tag = "catalog"
)]
pub async fn list_statuses(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.workflow.catalog().names())
}

/// GET /api/vehicle-classes — Vehicle class catalog.
#[utoipa::path(
    get,
    path = "/api/vehicle-classes",
    responses((status = 200, description = "Vehicle class names, alphabetical", body = Vec<String>)),
    tag = "catalog"
)]
pub async fn list_vehicle_classes(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.vehicle_classes.names())
}
