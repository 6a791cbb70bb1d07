//! Reference data: the `statuses` and `vehicle_classes` tables.

use sqlx::PgPool;

/// Status names, alphabetical.
pub async fn load_statuses(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT name FROM statuses ORDER BY name")
        .fetch_all(pool)
        .await
}

/// Vehicle class names, alphabetical.
pub async fn load_vehicle_classes(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT name FROM vehicle_classes ORDER BY name")
        .fetch_all(pool)
        .await
}
