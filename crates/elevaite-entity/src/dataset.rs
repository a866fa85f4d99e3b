//! Dataset entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A dataset produced inside a project.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Dataset {
    /// Unique dataset identifier.
    pub id: Uuid,
    /// Owning project.
    pub project_id: Uuid,
    /// Display name.
    pub name: String,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// When the dataset was created.
    pub created_at: DateTime<Utc>,
}
