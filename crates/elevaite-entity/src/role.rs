//! Role entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A named bundle of account-scoped permissions.
///
/// `permissions` holds an `AccountScopedRbacPermission` object; users gain
/// its grants in an account through a role assignment.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Role {
    /// Unique role identifier.
    pub id: Uuid,
    /// Unique role name.
    pub name: String,
    /// Account-scoped permission tree.
    pub permissions: serde_json::Value,
    /// When the role was created.
    pub created_at: DateTime<Utc>,
    /// When the role was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Data required to create a role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRole {
    /// Role name.
    pub name: String,
    /// Validated account-scoped permission tree.
    pub permissions: serde_json::Value,
}

/// Partial role update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRole {
    /// New name.
    pub name: Option<String>,
    /// Replacement permission tree.
    pub permissions: Option<serde_json::Value>,
}
