//! Account (tenant) entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A tenant. Projects, role assignments and account admins hang off it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    /// Unique account identifier.
    pub id: Uuid,
    /// Unique account name.
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Data required to create an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccount {
    /// Account name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
}

/// Partial account update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAccount {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
}
