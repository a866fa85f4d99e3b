//! Account repository implementation.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use elevaite_core::error::{AppError, ErrorKind};
use elevaite_core::result::AppResult;
use elevaite_entity::account::{Account, CreateAccount, UpdateAccount};

use super::map_unique_violation;

/// Repository for account CRUD.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    pool: PgPool,
}

impl AccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find an account by primary key.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Account>> {
        sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find account", e))
    }

    /// Every account, alphabetically.
    pub async fn find_all(&self) -> AppResult<Vec<Account>> {
        sqlx::query_as::<_, Account>("SELECT * FROM accounts ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list accounts", e))
    }

    /// Accounts the user is a member of.
    pub async fn find_for_user(&self, user_id: Uuid) -> AppResult<Vec<Account>> {
        sqlx::query_as::<_, Account>(
            r#"
            SELECT a.* FROM accounts a
            JOIN user_accounts ua ON ua.account_id = a.id
            WHERE ua.user_id = $1
            ORDER BY a.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list accounts for user", e)
        })
    }

    /// Insert a new account.
    pub async fn create(&self, data: &CreateAccount) -> AppResult<Account> {
        sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (id, name, description)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(&data.name)
        .bind(&data.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_unique_violation(
                e,
                "accounts_name_key",
                format!("An account with the same name - '{}' - already exists", data.name),
                "Failed to create account",
            )
        })
    }

    /// Apply a partial update.
    pub async fn update(&self, id: Uuid, data: &UpdateAccount) -> AppResult<Account> {
        sqlx::query_as::<_, Account>(
            r#"
            UPDATE accounts SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                updated_at = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&data.name)
        .bind(&data.description)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            map_unique_violation(
                e,
                "accounts_name_key",
                "An account with the same name already exists",
                "Failed to update account",
            )
        })?
        .ok_or_else(|| AppError::not_found(format!("Account - '{id}' - not found")))
    }
}
