//! Project entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A project inside an account. Projects nest through `parent_project_id`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Project {
    /// Unique project identifier.
    pub id: Uuid,
    /// Owning account.
    pub account_id: Uuid,
    /// User who created the project.
    pub creator_id: Uuid,
    /// Parent project, if this is a sub-project.
    pub parent_project_id: Option<Uuid>,
    /// Name, unique within the account.
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// When the project was created.
    pub created_at: DateTime<Utc>,
    /// When the project was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Data required to create a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProject {
    /// Owning account.
    pub account_id: Uuid,
    /// Creating user.
    pub creator_id: Uuid,
    /// Parent project, if any.
    pub parent_project_id: Option<Uuid>,
    /// Project name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
}
