//! # llr-api — Axum API Service for LLR Desk
//!
//! HTTP surface for tracking learner's license (LLR) applications through
//! the regional transport office workflow.
//!
//! ## API Surface
//!
//! | Prefix                 | Module                 | Auth       |
//! |------------------------|------------------------|------------|
//! | `/register`, `/login`  | [`routes::accounts`]   | public     |
//! | `/api/tasks*`, `/api/check-tasks` | [`routes::tasks`] | optional |
//! | `/api/statuses`, `/api/vehicle-classes` | [`routes::catalog`] | optional |
//! | `/health/*`, `/metrics`, `/openapi.json` | here, [`middleware::metrics`], [`openapi`] | public |
//!
//! `/api/*` routes require a bearer token only when `require_auth` is set.
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! CorsLayer → TraceLayer → MetricsMiddleware → AuthMiddleware (/api/*) → Handler
//! ```

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;
pub mod store;

pub use error::AppError;
pub use state::AppState;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;

/// Assemble the full application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        signer: state
            .config
            .require_auth
            .then(|| state.signer.clone()),
    };

    // Task and reference-data routes, behind the optional bearer check.
    let api = Router::new()
        .merge(routes::tasks::router())
        .merge(routes::catalog::router())
        .route_layer(from_fn(auth::auth_middleware));

    // Public routes.
    let public = Router::new()
        .merge(routes::accounts::router())
        .merge(openapi::router())
        .route("/metrics", get(middleware::metrics::render))
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness));

    Router::new()
        .merge(public)
        .merge(api)
        .route_layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(axum::Extension(auth_config))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Liveness probe: 200 while the process serves requests.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: 200 once the configured database answers a ping.
async fn readiness(State(state): State<AppState>) -> (StatusCode, &'static str) {
    match &state.db_pool {
        Some(pool) => match db::ping(pool).await {
            Ok(()) => (StatusCode::OK, "ready"),
            Err(e) => {
                tracing::warn!(error = %e, "readiness check failed: database unreachable");
                (StatusCode::SERVICE_UNAVAILABLE, "database unavailable")
            }
        },
        None => (StatusCode::OK, "ready"),
    }
}
