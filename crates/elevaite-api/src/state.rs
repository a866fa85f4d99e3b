//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use elevaite_auth::{JwtDecoder, RbacSchemas, RbacValidator};
use elevaite_core::config::AppConfig;
use elevaite_core::error::AppError;
use elevaite_database::DatabasePool;
use elevaite_database::rbac::{PgRbacStoreProvider, RbacStoreProvider};
use elevaite_service::Services;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    pub config: Arc<AppConfig>,

    // ── Infrastructure ───────────────────────────────────────
    /// PostgreSQL connection pool
    pub db: DatabasePool,
    /// Opens the per-request sessions RBAC validation reads through
    pub rbac_store: Arc<dyn RbacStoreProvider>,

    // ── Auth ─────────────────────────────────────────────────
    /// JWT access token decoder and validator
    pub jwt_decoder: Arc<JwtDecoder>,
    /// Permission validator over the indexed schemas
    pub validator: Arc<RbacValidator>,

    // ── Services ─────────────────────────────────────────────
    pub services: Services,
}

impl AppState {
    /// Wire the state against a database pool, with RBAC reads going to
    /// the same database.
    pub fn new(config: AppConfig, db: DatabasePool) -> Result<Self, AppError> {
        let rbac_store = Arc::new(PgRbacStoreProvider::new(db.pool().clone()));
        Self::with_rbac_store(config, db, rbac_store)
    }

    /// Wire the state with an explicit RBAC store provider.
    pub fn with_rbac_store(
        config: AppConfig,
        db: DatabasePool,
        rbac_store: Arc<dyn RbacStoreProvider>,
    ) -> Result<Self, AppError> {
        let schemas = RbacSchemas::build()?;
        let services = Services::new(&db, config.auth.apikey_max_lifetime_days);
        Ok(Self {
            jwt_decoder: Arc::new(JwtDecoder::new(&config.auth)),
            validator: Arc::new(RbacValidator::new(Arc::new(schemas))),
            config: Arc::new(config),
            db,
            rbac_store,
            services,
        })
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("db", &self.db)
            .field("services", &self.services)
            .finish_non_exhaustive()
    }
}
