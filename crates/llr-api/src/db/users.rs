//! Account persistence on the `users` table.

use chrono::{DateTime, Utc};
use llr_core::UserId;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::UserAccount;

/// Insert an account. Returns `false` when the email is already taken.
pub async fn insert(pool: &PgPool, account: &UserAccount) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO users (id, username, email, password_hash, created_at)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(account.id.0)
    .bind(&account.username)
    .bind(&account.email)
    .bind(&account.password_hash)
    .bind(account.created_at)
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(true),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Ok(false),
        Err(e) => Err(e),
    }
}

pub async fn load_all(pool: &PgPool) -> Result<Vec<UserAccount>, sqlx::Error> {
    let rows = sqlx::query_as::<_, UserRow>(
        "SELECT id, username, email, password_hash, created_at FROM users ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(UserRow::into_account).collect())
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_account(self) -> UserAccount {
        UserAccount {
            id: UserId(self.id),
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            created_at: self.created_at,
        }
    }
}
