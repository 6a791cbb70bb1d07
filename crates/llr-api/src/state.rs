//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! ## Architecture
//!
//! - **Tasks** and **users** live in in-memory [`Store`]s that serve every
//!   read. When a database pool is configured, writes go to PostgreSQL
//!   first and the stores are hydrated from it on startup.
//! - The **workflow engine** and **vehicle classes** are reference data,
//!   loaded from the database when present and defaulted otherwise.
//! - The **token signer** issues and verifies login tokens.

use std::collections::HashMap;
use std::sync::Arc;

use llr_state::{StatusCatalog, VehicleClassCatalog, WorkflowEngine};
use parking_lot::RwLock;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::TokenSigner;
use crate::config::AppConfig;
use crate::middleware::metrics::MetricsHandle;
use crate::store::{StoreError, TaskStore, UserStore};

// -- Generic In-Memory Store --------------------------------------------------

/// Thread-safe, cloneable in-memory key-value store.
///
/// All operations are synchronous (the RwLock is `parking_lot`, not `tokio::sync`)
/// because the lock is never held across `.await` points. `parking_lot::RwLock`
/// is non-poisonable.
#[derive(Debug)]
pub struct Store<T: Clone + Send + Sync> {
    data: Arc<RwLock<HashMap<Uuid, T>>>,
}

impl<T: Clone + Send + Sync> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<T: Clone + Send + Sync> Store<T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a record, returning the previous value if the key existed.
    pub fn insert(&self, id: Uuid, value: T) -> Option<T> {
        self.data.write().insert(id, value)
    }

    /// Insert a record unless an existing one satisfies `clashes`.
    ///
    /// The scan and the insert happen under one write lock. Returns `false`
    /// when a clash prevented the insert.
    pub fn insert_unless(&self, id: Uuid, value: T, clashes: impl Fn(&T) -> bool) -> bool {
        let mut guard = self.data.write();
        if guard.values().any(clashes) {
            return false;
        }
        guard.insert(id, value);
        true
    }

    /// Retrieve a record by ID.
    pub fn get(&self, id: &Uuid) -> Option<T> {
        self.data.read().get(id).cloned()
    }

    /// First record matching a predicate.
    pub fn find(&self, predicate: impl Fn(&T) -> bool) -> Option<T> {
        self.data.read().values().find(|v| predicate(v)).cloned()
    }

    /// List all records.
    pub fn list(&self) -> Vec<T> {
        self.data.read().values().cloned().collect()
    }

    /// Atomically read-validate-update a record.
    ///
    /// The closure runs under a single write lock. Returns `None` if the
    /// record doesn't exist, or `Some(result)` with the closure's `Result`.
    pub fn try_update<R, E>(
        &self,
        id: &Uuid,
        f: impl FnOnce(&mut T) -> Result<R, E>,
    ) -> Option<Result<R, E>> {
        self.data.write().get_mut(id).map(f)
    }

    /// Remove a record by ID.
    pub fn remove(&self, id: &Uuid) -> Option<T> {
        self.data.write().remove(id)
    }

    /// Check if a record exists.
    pub fn contains(&self, id: &Uuid) -> bool {
        self.data.read().contains_key(id)
    }

    /// Return the number of records.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + Send + Sync> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

// -- Application State --------------------------------------------------------

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub tasks: TaskStore,
    pub users: UserStore,

    /// Status workflow rules over the status catalog.
    pub workflow: Arc<WorkflowEngine>,
    pub vehicle_classes: Arc<VehicleClassCatalog>,

    /// Issues login tokens and verifies bearer tokens.
    pub signer: TokenSigner,

    /// PostgreSQL pool. `None` means in-memory-only mode.
    pub db_pool: Option<PgPool>,

    /// Prometheus handle, present when the global recorder was installed.
    pub metrics: Option<MetricsHandle>,

    pub config: AppConfig,
}

impl AppState {
    /// In-memory state with default configuration and an ephemeral signing key.
    pub fn new() -> Self {
        let config = AppConfig::default();
        let signer = TokenSigner::ephemeral(config.token_ttl_secs);
        Self::with_config(config, signer, None)
    }

    /// State with the given configuration, signer and optional database pool.
    pub fn with_config(config: AppConfig, signer: TokenSigner, db_pool: Option<PgPool>) -> Self {
        Self {
            tasks: TaskStore::new(db_pool.clone()),
            users: UserStore::new(db_pool.clone()),
            workflow: Arc::new(WorkflowEngine::new(
                StatusCatalog::default(),
                config.strict_statuses,
            )),
            vehicle_classes: Arc::new(VehicleClassCatalog::default()),
            signer,
            db_pool,
            metrics: None,
            config,
        }
    }

    /// Hydrate stores and reference data from the database.
    ///
    /// Called once on startup. A no-op without a pool. Empty reference
    /// tables keep the built-in defaults.
    pub async fn hydrate_from_db(&mut self) -> Result<(), StoreError> {
        let Some(pool) = self.db_pool.clone() else {
            return Ok(());
        };

        let statuses = crate::db::catalog::load_statuses(&pool).await?;
        if !statuses.is_empty() {
            self.workflow = Arc::new(WorkflowEngine::new(
                StatusCatalog::from_names(statuses),
                self.config.strict_statuses,
            ));
        }
        let classes = crate::db::catalog::load_vehicle_classes(&pool).await?;
        if !classes.is_empty() {
            self.vehicle_classes = Arc::new(VehicleClassCatalog::from_names(classes));
        }

        let task_count = self.tasks.hydrate().await?;
        let user_count = self.users.hydrate().await?;

        tracing::info!(
            tasks = task_count,
            users = user_count,
            statuses = self.workflow.catalog().len(),
            vehicle_classes = self.vehicle_classes.names().len(),
            "Hydrated in-memory stores from database"
        );

        Ok(())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
