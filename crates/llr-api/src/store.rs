//! # Task and User Stores
//!
//! Handles injected through [`crate::AppState`]. Reads come from memory.
//! Writes go to PostgreSQL first (when a pool is configured) and to memory
//! after the database accepted them, so a failed write never leaves the
//! in-memory view ahead of the durable one.
//!
//! ## Task mutations
//!
//! [`TaskStore::mutate`] applies a function to a copy of the current
//! document and commits it with a compare-and-swap on the task's
//! `version`: `UPDATE ... WHERE id = $1 AND version = $2` in the database
//! and a version check under the write lock in memory. The loser of a
//! race gets [`StoreError::Conflict`] and nothing is written.

use chrono::Utc;
use llr_core::TaskId;
use llr_state::LicenseTask;
use sqlx::PgPool;
use thiserror::Error;

use crate::auth::UserAccount;
use crate::error::AppError;
use crate::state::Store;

/// Failures from the task and user stores.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("task {0} not found")]
    NotFound(TaskId),

    #[error("task {0} was modified concurrently")]
    Conflict(TaskId),

    #[error("an account with email {0:?} already exists")]
    DuplicateEmail(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => Self::NotFound("Task not found".to_string()),
            StoreError::Conflict(_) => Self::Conflict(format!("{err}; retry the request")),
            StoreError::DuplicateEmail(_) => Self::Conflict(err.to_string()),
            StoreError::Database(_) => Self::Internal(err.to_string()),
        }
    }
}

// -- Tasks --------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct TaskStore {
    memory: Store<LicenseTask>,
    pool: Option<PgPool>,
}

impl TaskStore {
    pub fn new(pool: Option<PgPool>) -> Self {
        Self {
            memory: Store::new(),
            pool,
        }
    }

    /// Load every persisted task into memory. Returns the count loaded.
    pub async fn hydrate(&self) -> Result<usize, StoreError> {
        let Some(pool) = &self.pool else {
            return Ok(0);
        };
        let tasks = crate::db::tasks::load_all(pool).await?;
        let count = tasks.len();
        for task in tasks {
            self.memory.insert(*task.id().as_uuid(), task);
        }
        Ok(count)
    }

    /// Store a new task.
    pub async fn insert(&self, task: LicenseTask) -> Result<LicenseTask, StoreError> {
        if let Some(pool) = &self.pool {
            crate::db::tasks::insert(pool, &task).await?;
        }
        self.memory.insert(*task.id().as_uuid(), task.clone());
        Ok(task)
    }

    pub fn get(&self, id: TaskId) -> Option<LicenseTask> {
        self.memory.get(id.as_uuid())
    }

    /// Every task, in no particular order.
    pub fn list(&self) -> Vec<LicenseTask> {
        self.memory.list()
    }

    pub fn len(&self) -> usize {
        self.memory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }

    /// Apply `f` to the task and commit the result if nobody else did first.
    ///
    /// An error from `f` aborts without writing. Returns the committed task
    /// and `f`'s output.
    pub async fn mutate<R, E>(
        &self,
        id: TaskId,
        f: impl FnOnce(&mut LicenseTask) -> Result<R, E>,
    ) -> Result<(LicenseTask, R), E>
    where
        E: From<StoreError>,
    {
        let current = self
            .memory
            .get(id.as_uuid())
            .ok_or(StoreError::NotFound(id))?;
        let expected = current.version();

        let mut next = current;
        let output = f(&mut next)?;
        next.mark_committed(Utc::now());

        if let Some(pool) = &self.pool {
            let swapped = crate::db::tasks::update(pool, &next, expected)
                .await
                .map_err(StoreError::from)?;
            if !swapped {
                tracing::warn!(task_id = %id, expected, "task version moved underneath update");
                return Err(StoreError::Conflict(id).into());
            }
        }

        self.memory
            .try_update(id.as_uuid(), |slot| {
                if slot.version() == expected {
                    *slot = next.clone();
                    Ok(())
                } else {
                    Err(StoreError::Conflict(id))
                }
            })
            .ok_or(StoreError::NotFound(id))??;

        Ok((next, output))
    }

    /// Delete a task. Unknown ids are [`StoreError::NotFound`].
    pub async fn delete(&self, id: TaskId) -> Result<(), StoreError> {
        if !self.memory.contains(id.as_uuid()) {
            return Err(StoreError::NotFound(id));
        }
        if let Some(pool) = &self.pool {
            if !crate::db::tasks::delete(pool, id).await? {
                return Err(StoreError::NotFound(id));
            }
        }
        self.memory
            .remove(id.as_uuid())
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }
}

// -- Users --------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct UserStore {
    memory: Store<UserAccount>,
    pool: Option<PgPool>,
}

impl UserStore {
    pub fn new(pool: Option<PgPool>) -> Self {
        Self {
            memory: Store::new(),
            pool,
        }
    }

    pub async fn hydrate(&self) -> Result<usize, StoreError> {
        let Some(pool) = &self.pool else {
            return Ok(0);
        };
        let users = crate::db::users::load_all(pool).await?;
        let count = users.len();
        for user in users {
            self.memory.insert(*user.id.as_uuid(), user);
        }
        Ok(count)
    }

    /// Store a new account. Emails are unique, compared case-insensitively.
    pub async fn register(&self, account: UserAccount) -> Result<(), StoreError> {
        let email = account.email.clone();
        if self.find_by_login(&email).is_some() {
            return Err(StoreError::DuplicateEmail(email));
        }
        if let Some(pool) = &self.pool {
            if !crate::db::users::insert(pool, &account).await? {
                return Err(StoreError::DuplicateEmail(email));
            }
        }
        let inserted =
            self.memory
                .insert_unless(*account.id.as_uuid(), account, |u| u.matches_login(&email));
        if inserted {
            Ok(())
        } else {
            Err(StoreError::DuplicateEmail(email))
        }
    }

    /// Look up the account a login id (email) refers to.
    pub fn find_by_login(&self, login_id: &str) -> Option<UserAccount> {
        self.memory.find(|u| u.matches_login(login_id))
    }

    pub fn len(&self) -> usize {
        self.memory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use llr_state::NewTask;

    fn task() -> LicenseTask {
        LicenseTask::new(
            NewTask {
                applicant_name: "Meena".into(),
                vehicle_class: vec!["Car".into()],
                ..NewTask::default()
            },
            Utc::now(),
        )
    }

    fn account(email: &str) -> UserAccount {
        UserAccount::new("clerk", email, "hash".into(), Utc::now())
    }

    #[tokio::test]
    async fn insert_then_get() {
        let store = TaskStore::new(None);
        let t = store.insert(task()).await.unwrap();
        assert_eq!(store.get(t.id()), Some(t));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn mutate_commits_and_bumps_version() {
        let store = TaskStore::new(None);
        let t = store.insert(task()).await.unwrap();
        let (updated, out) = store
            .mutate(t.id(), |task| {
                task.mobile = "9999999999".into();
                Ok::<_, StoreError>(42)
            })
            .await
            .unwrap();
        assert_eq!(out, 42);
        assert_eq!(updated.version(), 1);
        assert_eq!(store.get(t.id()).unwrap().mobile, "9999999999");
    }

    #[tokio::test]
    async fn failed_mutation_writes_nothing() {
        let store = TaskStore::new(None);
        let t = store.insert(task()).await.unwrap();
        let result = store
            .mutate(t.id(), |task| {
                task.mobile = "changed".into();
                Err::<(), _>(StoreError::Conflict(task.id()))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(store.get(t.id()), Some(t));
    }

    #[tokio::test]
    async fn mutate_unknown_task_is_not_found() {
        let store = TaskStore::new(None);
        let result = store
            .mutate(TaskId::new(), |_| Ok::<_, StoreError>(()))
            .await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn stale_version_loses_the_race() {
        let store = TaskStore::new(None);
        let t = store.insert(task()).await.unwrap();
        let id = t.id();
        let racer = store.clone();
        let result = store
            .mutate(id, |task| {
                // Another writer commits while this closure holds a stale copy.
                racer.memory.try_update(id.as_uuid(), |slot| {
                    slot.mark_committed(Utc::now());
                    Ok::<_, ()>(())
                });
                task.notes = "stale".into();
                Ok::<_, StoreError>(())
            })
            .await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
        assert_ne!(store.get(id).unwrap().notes, "stale");
    }

    #[tokio::test]
    async fn delete_twice_is_not_found() {
        let store = TaskStore::new(None);
        let t = store.insert(task()).await.unwrap();
        store.delete(t.id()).await.unwrap();
        assert!(matches!(store.delete(t.id()).await, Err(StoreError::NotFound(_))));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn duplicate_email_rejected_case_insensitively() {
        let users = UserStore::new(None);
        users.register(account("clerk@example.com")).await.unwrap();
        let err = users.register(account("CLERK@example.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail(_)));
        assert_eq!(users.len(), 1);
    }

    #[tokio::test]
    async fn find_by_login_uses_email() {
        let users = UserStore::new(None);
        users.register(account("desk@example.com")).await.unwrap();
        assert!(users.find_by_login(" Desk@Example.com ").is_some());
        assert!(users.find_by_login("clerk").is_none());
    }

    #[test]
    fn store_errors_map_to_http_errors() {
        assert!(matches!(
            AppError::from(StoreError::NotFound(TaskId::new())),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            AppError::from(StoreError::Conflict(TaskId::new())),
            AppError::Conflict(_)
        ));
        assert!(matches!(
            AppError::from(StoreError::DuplicateEmail("a@b".into())),
            AppError::Conflict(_)
        ));
    }
}
