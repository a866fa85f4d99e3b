//! Project repository implementation.

use sqlx::PgPool;
use uuid::Uuid;

use elevaite_core::error::{AppError, ErrorKind};
use elevaite_core::result::AppResult;
use elevaite_entity::project::{CreateProject, Project};

use super::map_unique_violation;

/// Repository for projects.
#[derive(Debug, Clone)]
pub struct ProjectRepository {
    pool: PgPool,
}

impl ProjectRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a project by primary key.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Project>> {
        sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find project", e))
    }

    /// Projects of an account directly under `parent` (the account root when `None`).
    pub async fn find_by_account(
        &self,
        account_id: Uuid,
        parent: Option<Uuid>,
    ) -> AppResult<Vec<Project>> {
        sqlx::query_as::<_, Project>(
            r#"
            SELECT * FROM projects
            WHERE account_id = $1 AND parent_project_id IS NOT DISTINCT FROM $2
            ORDER BY name
            "#,
        )
        .bind(account_id)
        .bind(parent)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list projects", e))
    }

    /// Same as [`find_by_account`](Self::find_by_account), restricted to
    /// projects the user is a member of.
    pub async fn find_by_member(
        &self,
        user_id: Uuid,
        account_id: Uuid,
        parent: Option<Uuid>,
    ) -> AppResult<Vec<Project>> {
        sqlx::query_as::<_, Project>(
            r#"
            SELECT p.* FROM projects p
            JOIN user_projects up ON up.project_id = p.id
            WHERE up.user_id = $1
              AND p.account_id = $2
              AND p.parent_project_id IS NOT DISTINCT FROM $3
            ORDER BY p.name
            "#,
        )
        .bind(user_id)
        .bind(account_id)
        .bind(parent)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list member projects", e)
        })
    }

    /// Insert a project and make its creator a project admin, atomically.
    pub async fn create_with_admin(&self, data: &CreateProject) -> AppResult<Project> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (id, account_id, creator_id, parent_project_id, name, description)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(data.account_id)
        .bind(data.creator_id)
        .bind(data.parent_project_id)
        .bind(&data.name)
        .bind(&data.description)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            map_unique_violation(
                e,
                "projects_account_id_name_key",
                format!(
                    "A project with the same name - '{}' - already exists in account - '{}'",
                    data.name, data.account_id
                ),
                "Failed to create project",
            )
        })?;

        sqlx::query(
            r#"
            INSERT INTO user_projects (id, user_id, project_id, is_admin, permission_overrides)
            VALUES ($1, $2, $3, TRUE, '{}'::jsonb)
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(data.creator_id)
        .bind(project.id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to assign project creator", e)
        })?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit project creation", e)
        })?;
        Ok(project)
    }
}
