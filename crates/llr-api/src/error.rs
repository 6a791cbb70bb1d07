//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps domain errors from llr-core, llr-state and the stores to HTTP
//! status codes and a flat JSON body `{"error": ..., "code": ...}`.
//! Internal error details are logged, never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use llr_core::IdentifierError;
use llr_state::WorkflowError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Human-readable error message.
    pub error: String,
    /// Machine-readable error code (e.g. "NOT_FOUND", "VALIDATION_ERROR").
    pub code: String,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("{0}")]
    NotFound(String),

    /// Request failed business validation (400).
    #[error("{0}")]
    Validation(String),

    /// Request body or path could not be parsed (400).
    #[error("{0}")]
    BadRequest(String),

    /// Login failed: unknown user or wrong password (400).
    #[error("{0}")]
    InvalidCredentials(String),

    /// Missing or invalid bearer token (401).
    #[error("{0}")]
    Unauthorized(String),

    /// Conflict with current resource state (409).
    #[error("{0}")]
    Conflict(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::InvalidCredentials(_) => (StatusCode::BAD_REQUEST, "INVALID_CREDENTIALS"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "Server error".to_string(),
            other => other.to_string(),
        };

        if matches!(&self, Self::Internal(_)) {
            tracing::error!(error = %self, "internal server error");
        }

        let body = ErrorBody {
            error: message,
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Workflow rejections are client errors, except for calendar overflow.
impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::Calendar(_) => Self::Internal(err.to_string()),
            other => Self::Validation(other.to_string()),
        }
    }
}

impl From<IdentifierError> for AppError {
    fn from(err: IdentifierError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use llr_core::{CalendarError, TaskId};

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn not_found_status_code() {
        let (status, code) = AppError::NotFound("Task not found".into()).status_and_code();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(code, "NOT_FOUND");
    }

    #[test]
    fn client_errors_are_400() {
        for err in [
            AppError::Validation("v".into()),
            AppError::BadRequest("b".into()),
            AppError::InvalidCredentials("c".into()),
        ] {
            assert_eq!(err.status_and_code().0, StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn unauthorized_and_conflict_codes() {
        assert_eq!(
            AppError::Unauthorized("x".into()).status_and_code(),
            (StatusCode::UNAUTHORIZED, "UNAUTHORIZED")
        );
        assert_eq!(
            AppError::Conflict("x".into()).status_and_code(),
            (StatusCode::CONFLICT, "CONFLICT")
        );
    }

    #[test]
    fn workflow_errors_map_to_validation() {
        let err: AppError = WorkflowError::MissingApplicationNumber.into();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(
            err.to_string(),
            "Application number is required before issuing LLR"
        );
    }

    #[test]
    fn calendar_overflow_is_internal() {
        let err: AppError = WorkflowError::Calendar(CalendarError::DaysOutOfRange {
            date: "+262142-12-31".into(),
            days: 30,
        })
        .into();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[test]
    fn malformed_id_is_bad_request() {
        let err: AppError = TaskId::parse("not-a-uuid").unwrap_err().into();
        assert_eq!(err.status_and_code().1, "BAD_REQUEST");
    }

    #[tokio::test]
    async fn body_carries_message_and_code() {
        let (status, json) = body_json(AppError::InvalidCredentials("User not found".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "User not found");
        assert_eq!(json["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn internal_errors_hide_details() {
        let (status, json) = body_json(AppError::Internal("pool timed out".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "Server error");
        assert!(!json.to_string().contains("pool timed out"));
    }
}
