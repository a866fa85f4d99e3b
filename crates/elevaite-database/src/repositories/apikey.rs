//! API key repository implementation.

use sqlx::PgPool;
use uuid::Uuid;

use elevaite_core::error::{AppError, ErrorKind};
use elevaite_core::result::AppResult;
use elevaite_entity::apikey::{Apikey, CreateApikey};

use super::map_unique_violation;

/// Repository for API keys.
#[derive(Debug, Clone)]
pub struct ApikeyRepository {
    pool: PgPool,
}

impl ApikeyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a key by primary key.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Apikey>> {
        sqlx::query_as::<_, Apikey>("SELECT * FROM apikeys WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find apikey", e))
    }

    /// Keys bound to a project, newest first.
    pub async fn find_by_project(&self, project_id: Uuid) -> AppResult<Vec<Apikey>> {
        sqlx::query_as::<_, Apikey>(
            "SELECT * FROM apikeys WHERE project_id = $1 ORDER BY created_at DESC",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list apikeys", e))
    }

    /// Persist a new key.
    pub async fn create(&self, data: &CreateApikey) -> AppResult<Apikey> {
        sqlx::query_as::<_, Apikey>(
            r#"
            INSERT INTO apikeys
                (id, name, creator_id, project_id, permissions_type, key_hash, permissions, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(data.id)
        .bind(&data.name)
        .bind(data.creator_id)
        .bind(data.project_id)
        .bind(data.permissions_type)
        .bind(&data.key_hash)
        .bind(&data.permissions)
        .bind(data.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_unique_violation(
                e,
                "apikeys_project_id_creator_id_name_key",
                format!(
                    "An apikey with the same name - '{}' - already exists in project - '{}'",
                    data.name, data.project_id
                ),
                "Failed to create apikey",
            )
        })
    }

    /// Delete a key within its project.
    pub async fn delete(&self, id: Uuid, project_id: Uuid) -> AppResult<bool> {
        sqlx::query("DELETE FROM apikeys WHERE id = $1 AND project_id = $2")
            .bind(id)
            .bind(project_id)
            .execute(&self.pool)
            .await
            .map(|r| r.rows_affected() > 0)
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete apikey", e))
    }
}
