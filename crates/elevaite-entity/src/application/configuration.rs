//! Application configuration entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A saved configuration for an application.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Configuration {
    /// Unique configuration identifier.
    pub id: Uuid,
    /// Application this configuration belongs to.
    pub application_id: Uuid,
    /// Display name.
    pub name: String,
    /// Templates are offered as starting points for new configurations.
    pub is_template: bool,
    /// Raw configuration payload.
    pub raw: serde_json::Value,
    /// When the configuration was created.
    pub created_at: DateTime<Utc>,
    /// When the configuration was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Data required to create a configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateConfiguration {
    /// Owning application.
    pub application_id: Uuid,
    /// Display name.
    pub name: String,
    /// Template flag.
    pub is_template: bool,
    /// Raw payload.
    pub raw: serde_json::Value,
}

/// Partial configuration update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateConfiguration {
    /// New name.
    pub name: Option<String>,
    /// New template flag.
    pub is_template: Option<bool>,
    /// Replacement payload.
    pub raw: Option<serde_json::Value>,
}
