//! Role repository implementation.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use elevaite_core::error::{AppError, ErrorKind};
use elevaite_core::result::AppResult;
use elevaite_entity::role::{CreateRole, Role, UpdateRole};

use super::map_unique_violation;

/// Repository for roles.
#[derive(Debug, Clone)]
pub struct RoleRepository {
    pool: PgPool,
}

impl RoleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a role by primary key.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Role>> {
        sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find role", e))
    }

    /// Every role, alphabetically.
    pub async fn find_all(&self) -> AppResult<Vec<Role>> {
        sqlx::query_as::<_, Role>("SELECT * FROM roles ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list roles", e))
    }

    /// Roles assigned to an account membership.
    pub async fn find_by_user_account(&self, user_account_id: Uuid) -> AppResult<Vec<Role>> {
        sqlx::query_as::<_, Role>(
            r#"
            SELECT r.* FROM roles r
            JOIN role_user_accounts rua ON rua.role_id = r.id
            WHERE rua.user_account_id = $1
            ORDER BY r.name
            "#,
        )
        .bind(user_account_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list assigned roles", e)
        })
    }

    /// Insert a new role.
    pub async fn create(&self, data: &CreateRole) -> AppResult<Role> {
        sqlx::query_as::<_, Role>(
            "INSERT INTO roles (id, name, permissions) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(&data.name)
        .bind(&data.permissions)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_unique_violation(
                e,
                "roles_name_key",
                format!("A role with the same name - '{}' - already exists", data.name),
                "Failed to create role",
            )
        })
    }

    /// Apply a partial update.
    pub async fn update(&self, id: Uuid, data: &UpdateRole) -> AppResult<Role> {
        sqlx::query_as::<_, Role>(
            r#"
            UPDATE roles SET
                name = COALESCE($2, name),
                permissions = COALESCE($3, permissions),
                updated_at = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&data.name)
        .bind(&data.permissions)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            map_unique_violation(
                e,
                "roles_name_key",
                "A role with the same name already exists",
                "Failed to update role",
            )
        })?
        .ok_or_else(|| AppError::not_found(format!("Role - '{id}' - not found")))
    }

    /// Delete a role; assignments cascade.
    pub async fn delete(&self, id: Uuid) -> AppResult<bool> {
        sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map(|r| r.rows_affected() > 0)
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete role", e))
    }
}
