//! Application instance entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Lifecycle state of an instance run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "instance_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InstanceStatus {
    /// Created, not yet started.
    Starting,
    /// Currently executing.
    Running,
    /// Finished successfully.
    Completed,
    /// Finished with an error.
    Failed,
}

/// A run of an application configuration inside a project.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Instance {
    /// Unique instance identifier.
    pub id: Uuid,
    /// Application being run.
    pub application_id: Uuid,
    /// Configuration used for the run.
    pub configuration_id: Uuid,
    /// Project the instance runs in.
    pub project_id: Uuid,
    /// Display name.
    pub name: String,
    /// Current status.
    pub status: InstanceStatus,
    /// When the instance was created.
    pub created_at: DateTime<Utc>,
}

/// Data required to create an instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInstance {
    /// Application to run.
    pub application_id: Uuid,
    /// Configuration to use.
    pub configuration_id: Uuid,
    /// Project to run in.
    pub project_id: Uuid,
    /// Display name.
    pub name: String,
}
