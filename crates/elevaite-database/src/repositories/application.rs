//! Application, configuration and instance repositories.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use elevaite_core::error::{AppError, ErrorKind};
use elevaite_core::result::AppResult;
use elevaite_entity::application::{
    Application, Configuration, CreateConfiguration, CreateInstance, Instance, UpdateConfiguration,
};

/// Repository for applications.
#[derive(Debug, Clone)]
pub struct ApplicationRepository {
    pool: PgPool,
}

impl ApplicationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find an application by primary key.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Application>> {
        sqlx::query_as::<_, Application>("SELECT * FROM applications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find application", e)
            })
    }

    /// Applications whose type is not in `excluded_types`.
    pub async fn find_all_excluding(&self, excluded_types: &[String]) -> AppResult<Vec<Application>> {
        sqlx::query_as::<_, Application>(
            r#"
            SELECT * FROM applications
            WHERE application_type::text <> ALL($1)
            ORDER BY title
            "#,
        )
        .bind(excluded_types)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list applications", e))
    }
}

/// Repository for application configurations.
#[derive(Debug, Clone)]
pub struct ConfigurationRepository {
    pool: PgPool,
}

impl ConfigurationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a configuration within its application.
    pub async fn find(&self, application_id: Uuid, id: Uuid) -> AppResult<Option<Configuration>> {
        sqlx::query_as::<_, Configuration>(
            "SELECT * FROM configurations WHERE id = $1 AND application_id = $2",
        )
        .bind(id)
        .bind(application_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find configuration", e))
    }

    /// Configurations of an application.
    pub async fn find_by_application(&self, application_id: Uuid) -> AppResult<Vec<Configuration>> {
        sqlx::query_as::<_, Configuration>(
            "SELECT * FROM configurations WHERE application_id = $1 ORDER BY created_at DESC",
        )
        .bind(application_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list configurations", e)
        })
    }

    /// Insert a configuration.
    pub async fn create(&self, data: &CreateConfiguration) -> AppResult<Configuration> {
        sqlx::query_as::<_, Configuration>(
            r#"
            INSERT INTO configurations (id, application_id, name, is_template, raw)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(data.application_id)
        .bind(&data.name)
        .bind(data.is_template)
        .bind(&data.raw)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to create configuration", e)
        })
    }

    /// Apply a partial update.
    pub async fn update(
        &self,
        application_id: Uuid,
        id: Uuid,
        data: &UpdateConfiguration,
    ) -> AppResult<Configuration> {
        sqlx::query_as::<_, Configuration>(
            r#"
            UPDATE configurations SET
                name = COALESCE($3, name),
                is_template = COALESCE($4, is_template),
                raw = COALESCE($5, raw),
                updated_at = $6
            WHERE id = $1 AND application_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(application_id)
        .bind(&data.name)
        .bind(data.is_template)
        .bind(&data.raw)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update configuration", e)
        })?
        .ok_or_else(|| AppError::not_found(format!("Configuration - '{id}' - not found")))
    }
}

/// Repository for application instances.
#[derive(Debug, Clone)]
pub struct InstanceRepository {
    pool: PgPool,
}

impl InstanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Instances of an application inside a project.
    pub async fn find_by_application(
        &self,
        application_id: Uuid,
        project_id: Uuid,
    ) -> AppResult<Vec<Instance>> {
        sqlx::query_as::<_, Instance>(
            r#"
            SELECT * FROM instances
            WHERE application_id = $1 AND project_id = $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(application_id)
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list instances", e))
    }

    /// Insert an instance.
    pub async fn create(&self, data: &CreateInstance) -> AppResult<Instance> {
        sqlx::query_as::<_, Instance>(
            r#"
            INSERT INTO instances (id, application_id, configuration_id, project_id, name)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(data.application_id)
        .bind(data.configuration_id)
        .bind(data.project_id)
        .bind(&data.name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create instance", e))
    }
}
