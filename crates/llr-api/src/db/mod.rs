//! # Database Persistence Layer
//!
//! Postgres persistence via SQLx.
//!
//! The database layer is **optional**. When `DATABASE_URL` is set, tasks,
//! accounts and reference data are persisted to PostgreSQL. When absent,
//! the API runs in in-memory-only mode (development and tests).
//!
//! Each task is one row holding its full JSON document, status history
//! included. `id`, `version` and `created_at` are mirrored into columns
//! for the compare-and-swap update and ordering.

pub mod catalog;
pub mod tasks;
pub mod users;

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};

/// Connect, run embedded migrations, and return the pool.
///
/// Returns `None` when no URL is configured.
pub async fn init_pool(
    url: Option<&str>,
    max_connections: u32,
) -> Result<Option<PgPool>, sqlx::Error> {
    let Some(url) = url.filter(|u| !u.trim().is_empty()) else {
        tracing::warn!(
            "DATABASE_URL not set; running in-memory only mode. \
             State will not survive restarts."
        );
        return Ok(None);
    };

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(5))
        .connect(url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(Some(pool))
}

/// Round-trip a trivial query. Used by the readiness probe.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
