//! License task persistence.
//!
//! All functions take a `&PgPool` and operate on the `license_tasks` table.
//! Workflow rules are enforced by the engine, not in SQL.

use llr_core::TaskId;
use llr_state::LicenseTask;
use sqlx::PgPool;
use uuid::Uuid;

fn encode_document(task: &LicenseTask) -> Result<serde_json::Value, sqlx::Error> {
    serde_json::to_value(task).map_err(|e| {
        tracing::error!(task_id = %task.id(), error = %e, "failed to serialize task document");
        sqlx::Error::Encode(Box::new(e))
    })
}

fn version_column(version: u64) -> Result<i64, sqlx::Error> {
    i64::try_from(version).map_err(|e| sqlx::Error::Encode(Box::new(e)))
}

/// Insert a new task document.
pub async fn insert(pool: &PgPool, task: &LicenseTask) -> Result<(), sqlx::Error> {
    let document = encode_document(task)?;

    sqlx::query(
        "INSERT INTO license_tasks (id, version, status, document, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(task.id().0)
    .bind(version_column(task.version())?)
    .bind(task.status())
    .bind(&document)
    .bind(task.created_at())
    .bind(task.updated_at())
    .execute(pool)
    .await?;

    Ok(())
}

/// Replace the document if the stored version is still `expected_version`.
///
/// Returns `false` when the row is gone or another writer committed first.
pub async fn update(
    pool: &PgPool,
    task: &LicenseTask,
    expected_version: u64,
) -> Result<bool, sqlx::Error> {
    let document = encode_document(task)?;

    let result = sqlx::query(
        "UPDATE license_tasks
         SET version = $1, status = $2, document = $3, updated_at = $4
         WHERE id = $5 AND version = $6",
    )
    .bind(version_column(task.version())?)
    .bind(task.status())
    .bind(&document)
    .bind(task.updated_at())
    .bind(task.id().0)
    .bind(version_column(expected_version)?)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete a task. Returns `false` if no row matched.
pub async fn delete(pool: &PgPool, id: TaskId) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM license_tasks WHERE id = $1")
        .bind(id.0)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Load all task documents for hydration on startup.
///
/// Rows whose document no longer decodes are skipped with an error log.
pub async fn load_all(pool: &PgPool) -> Result<Vec<LicenseTask>, sqlx::Error> {
    let rows = sqlx::query_as::<_, TaskRow>(
        "SELECT id, document FROM license_tasks ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().filter_map(TaskRow::into_task).collect())
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct TaskRow {
    id: Uuid,
    document: serde_json::Value,
}

impl TaskRow {
    fn into_task(self) -> Option<LicenseTask> {
        match serde_json::from_value::<LicenseTask>(self.document) {
            Ok(task) if task.id().as_uuid() == &self.id => Some(task),
            Ok(task) => {
                tracing::error!(row_id = %self.id, document_id = %task.id(), "task document id does not match row id, skipping");
                None
            }
            Err(e) => {
                tracing::error!(row_id = %self.id, error = %e, "failed to decode task document, skipping");
                None
            }
        }
    }
}
