//! Dataset and collection repositories.

use sqlx::PgPool;
use uuid::Uuid;

use elevaite_core::error::{AppError, ErrorKind};
use elevaite_core::result::AppResult;
use elevaite_entity::collection::Collection;
use elevaite_entity::dataset::Dataset;

/// Repository for datasets.
#[derive(Debug, Clone)]
pub struct DatasetRepository {
    pool: PgPool,
}

impl DatasetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Datasets of a project.
    pub async fn find_by_project(&self, project_id: Uuid) -> AppResult<Vec<Dataset>> {
        sqlx::query_as::<_, Dataset>(
            "SELECT * FROM datasets WHERE project_id = $1 ORDER BY created_at DESC",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list datasets", e))
    }

    /// Find a dataset within its project.
    pub async fn find(&self, project_id: Uuid, id: Uuid) -> AppResult<Option<Dataset>> {
        sqlx::query_as::<_, Dataset>("SELECT * FROM datasets WHERE id = $1 AND project_id = $2")
            .bind(id)
            .bind(project_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find dataset", e))
    }

    /// Insert a dataset.
    pub async fn create(&self, project_id: Uuid, name: &str) -> AppResult<Dataset> {
        sqlx::query_as::<_, Dataset>(
            "INSERT INTO datasets (id, project_id, name) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(project_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create dataset", e))
    }

    /// Append tags that are not already present.
    pub async fn add_tags(&self, project_id: Uuid, id: Uuid, tags: &[String]) -> AppResult<Dataset> {
        sqlx::query_as::<_, Dataset>(
            r#"
            UPDATE datasets SET tags = ARRAY(
                SELECT DISTINCT t FROM unnest(tags || $3::text[]) AS t ORDER BY t
            )
            WHERE id = $1 AND project_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(project_id)
        .bind(tags)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to tag dataset", e))?
        .ok_or_else(|| AppError::not_found(format!("Dataset - '{id}' - not found")))
    }
}

/// Repository for collections.
#[derive(Debug, Clone)]
pub struct CollectionRepository {
    pool: PgPool,
}

impl CollectionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Collections of a project.
    pub async fn find_by_project(&self, project_id: Uuid) -> AppResult<Vec<Collection>> {
        sqlx::query_as::<_, Collection>(
            "SELECT * FROM collections WHERE project_id = $1 ORDER BY created_at DESC",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list collections", e))
    }

    /// Insert a collection.
    pub async fn create(&self, project_id: Uuid, name: &str) -> AppResult<Collection> {
        sqlx::query_as::<_, Collection>(
            "INSERT INTO collections (id, project_id, name) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(project_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to create collection", e)
        })
    }
}
