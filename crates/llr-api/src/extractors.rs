//! # Custom Extractors & Validation
//!
//! Provides the [`Validate`] trait for request DTOs, helpers to extract and
//! validate JSON bodies in handlers, and task-id parsing for path segments.

use axum::extract::rejection::JsonRejection;
use axum::Json;
use llr_core::TaskId;

use crate::error::AppError;

/// Longest accepted free-text field.
pub const MAX_FIELD_LEN: usize = 255;

/// Longest accepted notes field.
pub const MAX_NOTES_LEN: usize = 2000;

/// Trait for request types that can validate their business rules
/// beyond what serde deserialization checks.
pub trait Validate {
    /// Validate business rules. Returns an error message on failure.
    fn validate(&self) -> Result<(), String>;
}

/// Extract a JSON body, mapping deserialization errors to [`AppError::BadRequest`].
///
/// ```ignore
/// async fn handler(body: Result<Json<T>, JsonRejection>) -> Result<..., AppError> {
///     let req = extract_json(body)?;
/// }
/// ```
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Extract a JSON body and validate it using the [`Validate`] trait.
pub fn extract_validated_json<T: Validate>(
    result: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let value = extract_json(result)?;
    value.validate().map_err(AppError::Validation)?;
    Ok(value)
}

/// Parse a task id from a path segment. Malformed ids are a 400, not a 404.
pub fn parse_task_id(raw: &str) -> Result<TaskId, AppError> {
    Ok(TaskId::parse(raw)?)
}

/// Reject a string longer than `max` characters.
pub fn check_len(field: &str, value: &str, max: usize) -> Result<(), String> {
    if value.chars().count() > max {
        return Err(format!("{field} must not exceed {max} characters"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_task_id_accepts_uuid() {
        let id = TaskId::new();
        assert_eq!(parse_task_id(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn parse_task_id_rejects_garbage() {
        assert!(matches!(parse_task_id("123"), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn check_len_counts_characters() {
        assert!(check_len("name", "ज्ञान", 5).is_ok());
        assert!(check_len("name", "abcdef", 5).is_err());
    }
}
