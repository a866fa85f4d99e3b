//! PostgreSQL-backed RBAC sessions.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use elevaite_core::error::{AppError, ErrorKind};
use elevaite_core::AppResult;
use elevaite_entity::account::Account;
use elevaite_entity::apikey::Apikey;
use elevaite_entity::application::{Application, Configuration, Instance};
use elevaite_entity::association::{UserAccount, UserProject};
use elevaite_entity::collection::Collection;
use elevaite_entity::dataset::Dataset;
use elevaite_entity::project::Project;
use elevaite_entity::user::User;
use elevaite_entity::{ModelKind, Resource};

use super::{RbacStore, RbacStoreProvider};

/// Opens [`PgRbacStore`] sessions on a pool.
#[derive(Debug, Clone)]
pub struct PgRbacStoreProvider {
    pool: PgPool,
}

impl PgRbacStoreProvider {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RbacStoreProvider for PgRbacStoreProvider {
    async fn begin(&self) -> AppResult<Box<dyn RbacStore>> {
        let tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin RBAC session", e)
        })?;
        Ok(Box::new(PgRbacStore {
            tx: Mutex::new(Some(tx)),
        }))
    }
}

/// One database transaction used for a single request's authorization.
pub struct PgRbacStore {
    tx: Mutex<Option<Transaction<'static, Postgres>>>,
}

fn closed() -> AppError {
    AppError::internal("RBAC session is already closed")
}

fn db_err(message: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| AppError::with_source(ErrorKind::Database, message, e)
}

impl PgRbacStore {
    async fn fetch<T>(&self, sql: &'static str, id: Uuid) -> AppResult<Option<T>>
    where
        T: for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
    {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(closed)?;
        sqlx::query_as::<_, T>(sql)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(db_err("Failed to load RBAC resource"))
    }
}

#[async_trait]
impl RbacStore for PgRbacStore {
    async fn find_resource(&self, kind: ModelKind, id: Uuid) -> AppResult<Option<Resource>> {
        let resource = match kind {
            ModelKind::Account => self
                .fetch::<Account>("SELECT * FROM accounts WHERE id = $1", id)
                .await?
                .map(Resource::Account),
            ModelKind::Project => self
                .fetch::<Project>("SELECT * FROM projects WHERE id = $1", id)
                .await?
                .map(Resource::Project),
            ModelKind::User => self
                .fetch::<User>("SELECT * FROM users WHERE id = $1", id)
                .await?
                .map(Resource::User),
            ModelKind::Application => self
                .fetch::<Application>("SELECT * FROM applications WHERE id = $1", id)
                .await?
                .map(Resource::Application),
            ModelKind::Instance => self
                .fetch::<Instance>("SELECT * FROM instances WHERE id = $1", id)
                .await?
                .map(Resource::Instance),
            ModelKind::Configuration => self
                .fetch::<Configuration>("SELECT * FROM configurations WHERE id = $1", id)
                .await?
                .map(Resource::Configuration),
            ModelKind::Dataset => self
                .fetch::<Dataset>("SELECT * FROM datasets WHERE id = $1", id)
                .await?
                .map(Resource::Dataset),
            ModelKind::Collection => self
                .fetch::<Collection>("SELECT * FROM collections WHERE id = $1", id)
                .await?
                .map(Resource::Collection),
            ModelKind::Apikey => self
                .fetch::<Apikey>("SELECT * FROM apikeys WHERE id = $1", id)
                .await?
                .map(Resource::Apikey),
        };
        Ok(resource)
    }

    async fn find_user_account(
        &self,
        user_id: Uuid,
        account_id: Uuid,
    ) -> AppResult<Option<UserAccount>> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(closed)?;
        sqlx::query_as::<_, UserAccount>(
            "SELECT * FROM user_accounts WHERE user_id = $1 AND account_id = $2",
        )
        .bind(user_id)
        .bind(account_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(db_err("Failed to load user account association"))
    }

    async fn find_user_project(
        &self,
        user_id: Uuid,
        project_id: Uuid,
    ) -> AppResult<Option<UserProject>> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(closed)?;
        sqlx::query_as::<_, UserProject>(
            "SELECT * FROM user_projects WHERE user_id = $1 AND project_id = $2",
        )
        .bind(user_id)
        .bind(project_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(db_err("Failed to load user project association"))
    }

    async fn is_assigned_to_project_chain(
        &self,
        user_id: Uuid,
        project_id: Uuid,
    ) -> AppResult<bool> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(closed)?;
        sqlx::query_scalar::<_, bool>(
            r#"
            WITH RECURSIVE chain AS (
                SELECT id, parent_project_id FROM projects WHERE id = $2
                UNION ALL
                SELECT p.id, p.parent_project_id
                FROM projects p
                JOIN chain c ON p.id = c.parent_project_id
            )
            SELECT NOT EXISTS (
                SELECT 1 FROM chain c
                WHERE NOT EXISTS (
                    SELECT 1 FROM user_projects up
                    WHERE up.project_id = c.id AND up.user_id = $1
                )
            )
            "#,
        )
        .bind(user_id)
        .bind(project_id)
        .fetch_one(&mut **tx)
        .await
        .map_err(db_err("Failed to check project hierarchy assignment"))
    }

    async fn role_allows(&self, user_account_id: Uuid, path: &[String]) -> AppResult<bool> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(closed)?;
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM role_user_accounts rua
                JOIN roles r ON r.id = rua.role_id
                WHERE rua.user_account_id = $1
                  AND r.permissions #>> $2::text[] = 'Allow'
            )
            "#,
        )
        .bind(user_account_id)
        .bind(path)
        .fetch_one(&mut **tx)
        .await
        .map_err(db_err("Failed to check role permissions"))
    }

    async fn commit(&self) -> AppResult<()> {
        let tx = self.tx.lock().await.take().ok_or_else(closed)?;
        tx.commit()
            .await
            .map_err(db_err("Failed to commit RBAC session"))?;
        debug!("RBAC session committed");
        Ok(())
    }

    async fn rollback(&self) -> AppResult<()> {
        let tx = self.tx.lock().await.take().ok_or_else(closed)?;
        tx.rollback()
            .await
            .map_err(db_err("Failed to roll back RBAC session"))?;
        debug!("RBAC session rolled back");
        Ok(())
    }
}
