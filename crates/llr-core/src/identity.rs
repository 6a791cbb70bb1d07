//! # Identifier Newtypes
//!
//! Type-level distinction between task and user identifiers. Both are
//! random v4 UUIDs and serialize as bare UUID strings.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::IdentifierError;

/// Unique identifier of a license task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub Uuid);

/// Unique identifier of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl TaskId {
    /// Generate a new random task identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a task identifier from untrusted input.
    pub fn parse(input: &str) -> Result<Self, IdentifierError> {
        parse_uuid(input, "task").map(Self)
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl UserId {
    /// Generate a new random user identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a user identifier from untrusted input.
    pub fn parse(input: &str) -> Result<Self, IdentifierError> {
        parse_uuid(input, "user").map(Self)
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

fn parse_uuid(input: &str, kind: &'static str) -> Result<Uuid, IdentifierError> {
    Uuid::parse_str(input.trim()).map_err(|_| IdentifierError::Malformed {
        kind,
        input: input.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_ids_are_unique() {
        assert_ne!(TaskId::new(), TaskId::new());
    }

    #[test]
    fn parse_accepts_hyphenated_uuid() {
        let id = TaskId::new();
        assert_eq!(TaskId::parse(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn parse_trims_whitespace() {
        let id = UserId::new();
        assert_eq!(UserId::parse(&format!(" {id} ")).unwrap(), id);
    }

    #[test]
    fn parse_rejects_mongo_style_object_id() {
        let err = TaskId::parse("65a1f0c2e4b0a1b2c3d4e5f6").unwrap_err();
        assert_eq!(
            err,
            IdentifierError::Malformed {
                kind: "task",
                input: "65a1f0c2e4b0a1b2c3d4e5f6".to_string(),
            }
        );
        assert!(err.to_string().contains("invalid task id"));
    }

    #[test]
    fn serializes_as_bare_uuid() {
        let id = TaskId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        let back: TaskId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
