//! Membership and role-assignment repositories.

use sqlx::PgPool;
use uuid::Uuid;

use elevaite_core::error::{AppError, ErrorKind};
use elevaite_core::result::AppResult;
use elevaite_entity::association::{UserAccount, UserProject};

use super::map_unique_violation;

/// Repository for `user_accounts`.
#[derive(Debug, Clone)]
pub struct UserAccountRepository {
    pool: PgPool,
}

impl UserAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A user's membership in an account.
    pub async fn find(&self, user_id: Uuid, account_id: Uuid) -> AppResult<Option<UserAccount>> {
        sqlx::query_as::<_, UserAccount>(
            "SELECT * FROM user_accounts WHERE user_id = $1 AND account_id = $2",
        )
        .bind(user_id)
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find account membership", e)
        })
    }

    /// Every membership of an account.
    pub async fn find_by_account(&self, account_id: Uuid) -> AppResult<Vec<UserAccount>> {
        sqlx::query_as::<_, UserAccount>("SELECT * FROM user_accounts WHERE account_id = $1")
            .bind(account_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to list account memberships", e)
            })
    }

    /// Every account membership of a user.
    pub async fn find_by_user(&self, user_id: Uuid) -> AppResult<Vec<UserAccount>> {
        sqlx::query_as::<_, UserAccount>("SELECT * FROM user_accounts WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to list user memberships", e)
            })
    }

    /// How many of `user_ids` are members of the account.
    pub async fn count_members(&self, account_id: Uuid, user_ids: &[Uuid]) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM user_accounts WHERE account_id = $1 AND user_id = ANY($2)",
        )
        .bind(account_id)
        .bind(user_ids)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to count account members", e)
        })
    }

    /// Add a user to an account.
    pub async fn create(
        &self,
        user_id: Uuid,
        account_id: Uuid,
        is_admin: bool,
    ) -> AppResult<UserAccount> {
        sqlx::query_as::<_, UserAccount>(
            r#"
            INSERT INTO user_accounts (id, user_id, account_id, is_admin)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(user_id)
        .bind(account_id)
        .bind(is_admin)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_unique_violation(
                e,
                "user_accounts_user_id_account_id_key",
                format!("User - '{user_id}' - is already assigned to account - '{account_id}'"),
                "Failed to assign user to account",
            )
        })
    }

    /// Promote or demote an account admin.
    pub async fn set_admin(
        &self,
        user_id: Uuid,
        account_id: Uuid,
        is_admin: bool,
    ) -> AppResult<UserAccount> {
        sqlx::query_as::<_, UserAccount>(
            r#"
            UPDATE user_accounts SET is_admin = $3
            WHERE user_id = $1 AND account_id = $2
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(account_id)
        .bind(is_admin)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update account admin", e)
        })?
        .ok_or_else(|| {
            AppError::not_found(format!(
                "User - '{user_id}' - is not assigned to account - '{account_id}'"
            ))
        })
    }

    /// Remove a user from an account and from every project in it.
    pub async fn delete(&self, user_id: Uuid, account_id: Uuid) -> AppResult<bool> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        sqlx::query(
            r#"
            DELETE FROM user_projects up
            USING projects p
            WHERE up.project_id = p.id AND up.user_id = $1 AND p.account_id = $2
            "#,
        )
        .bind(user_id)
        .bind(account_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to remove project memberships", e)
        })?;

        let removed = sqlx::query("DELETE FROM user_accounts WHERE user_id = $1 AND account_id = $2")
            .bind(user_id)
            .bind(account_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to remove account membership", e)
            })?
            .rows_affected()
            > 0;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit membership removal", e)
        })?;
        Ok(removed)
    }
}

/// Repository for `user_projects`.
#[derive(Debug, Clone)]
pub struct UserProjectRepository {
    pool: PgPool,
}

impl UserProjectRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A user's membership in a project.
    pub async fn find(&self, user_id: Uuid, project_id: Uuid) -> AppResult<Option<UserProject>> {
        sqlx::query_as::<_, UserProject>(
            "SELECT * FROM user_projects WHERE user_id = $1 AND project_id = $2",
        )
        .bind(user_id)
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find project membership", e)
        })
    }

    /// How many of `user_ids` are members of the project.
    pub async fn count_members(&self, project_id: Uuid, user_ids: &[Uuid]) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM user_projects WHERE project_id = $1 AND user_id = ANY($2)",
        )
        .bind(project_id)
        .bind(user_ids)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to count project members", e)
        })
    }

    /// Add several users to a project as regular members, atomically.
    pub async fn create_many(&self, project_id: Uuid, user_ids: &[Uuid]) -> AppResult<()> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        for user_id in user_ids {
            sqlx::query(
                r#"
                INSERT INTO user_projects (id, user_id, project_id, is_admin, permission_overrides)
                VALUES ($1, $2, $3, FALSE, '{}'::jsonb)
                "#,
            )
            .bind(Uuid::now_v7())
            .bind(user_id)
            .bind(project_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                map_unique_violation(
                    e,
                    "user_projects_user_id_project_id_key",
                    format!("One or more users are already assigned to project - '{project_id}'"),
                    "Failed to assign users to project",
                )
            })?;
        }

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit project assignment", e)
        })
    }

    /// Remove a user from a project and from every project nested under it.
    pub async fn delete_with_descendants(&self, user_id: Uuid, project_id: Uuid) -> AppResult<bool> {
        sqlx::query(
            r#"
            WITH RECURSIVE subtree AS (
                SELECT id FROM projects WHERE id = $2
                UNION ALL
                SELECT p.id FROM projects p JOIN subtree s ON p.parent_project_id = s.id
            )
            DELETE FROM user_projects
            WHERE user_id = $1 AND project_id IN (SELECT id FROM subtree)
            "#,
        )
        .bind(user_id)
        .bind(project_id)
        .execute(&self.pool)
        .await
        .map(|r| r.rows_affected() > 0)
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to remove project membership", e)
        })
    }

    /// Promote or demote a project admin.
    pub async fn set_admin(
        &self,
        user_id: Uuid,
        project_id: Uuid,
        is_admin: bool,
    ) -> AppResult<UserProject> {
        sqlx::query_as::<_, UserProject>(
            r#"
            UPDATE user_projects SET is_admin = $3
            WHERE user_id = $1 AND project_id = $2
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(project_id)
        .bind(is_admin)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update project admin", e)
        })?
        .ok_or_else(|| {
            AppError::not_found(format!(
                "User - '{user_id}' - is not assigned to project - '{project_id}'"
            ))
        })
    }

    /// Replace a member's permission overrides.
    pub async fn update_overrides(
        &self,
        user_id: Uuid,
        project_id: Uuid,
        overrides: &serde_json::Value,
    ) -> AppResult<UserProject> {
        sqlx::query_as::<_, UserProject>(
            r#"
            UPDATE user_projects SET permission_overrides = $3
            WHERE user_id = $1 AND project_id = $2
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(project_id)
        .bind(overrides)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update permission overrides", e)
        })?
        .ok_or_else(|| {
            AppError::not_found(format!(
                "User - '{user_id}' - is not assigned to project - '{project_id}'"
            ))
        })
    }
}

/// Repository for `role_user_accounts`.
#[derive(Debug, Clone)]
pub struct RoleAssignmentRepository {
    pool: PgPool,
}

impl RoleAssignmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Replace the roles of an account membership with `role_ids`.
    pub async fn replace(&self, user_account_id: Uuid, role_ids: &[Uuid]) -> AppResult<()> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        sqlx::query("DELETE FROM role_user_accounts WHERE user_account_id = $1")
            .bind(user_account_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to clear role assignments", e)
            })?;

        for role_id in role_ids {
            sqlx::query(
                "INSERT INTO role_user_accounts (id, role_id, user_account_id) VALUES ($1, $2, $3)",
            )
            .bind(Uuid::now_v7())
            .bind(role_id)
            .bind(user_account_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to assign role", e)
            })?;
        }

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit role assignment", e)
        })
    }
}
