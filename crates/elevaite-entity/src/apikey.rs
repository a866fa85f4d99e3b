//! API key entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// How an API key's permissions were derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "apikey_permissions_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ApikeyPermissionsType {
    /// Snapshot of the creator's effective permissions in the project.
    Cloned,
    /// Explicit apikey-scoped permission object supplied at creation.
    Custom,
}

impl ApikeyPermissionsType {
    /// Return the type as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cloned => "cloned",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for ApikeyPermissionsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ApikeyPermissionsType {
    type Err = elevaite_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cloned" => Ok(Self::Cloned),
            "custom" => Ok(Self::Custom),
            _ => Err(elevaite_core::AppError::validation(format!(
                "Invalid apikey permissions type: '{s}'. Expected one of: cloned, custom"
            ))),
        }
    }
}

/// A project-bound API key.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Apikey {
    /// Unique key identifier.
    pub id: Uuid,
    /// Short display name.
    pub name: String,
    /// User who created the key.
    pub creator_id: Uuid,
    /// The only project the key may act in.
    pub project_id: Uuid,
    /// How `permissions` was derived.
    pub permissions_type: ApikeyPermissionsType,
    /// Argon2 hash of the key secret.
    #[serde(skip_serializing)]
    pub key_hash: String,
    /// Apikey-scoped permission tree.
    pub permissions: serde_json::Value,
    /// When the key was created.
    pub created_at: DateTime<Utc>,
    /// When the key stops authenticating.
    pub expires_at: DateTime<Utc>,
}

impl Apikey {
    /// Whether the key is past its expiry.
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Data required to persist a new API key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateApikey {
    /// Pre-generated key identifier (embedded in the plaintext key).
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Creating user.
    pub creator_id: Uuid,
    /// Bound project.
    pub project_id: Uuid,
    /// Derivation of `permissions`.
    pub permissions_type: ApikeyPermissionsType,
    /// Argon2 hash of the secret.
    pub key_hash: String,
    /// Apikey-scoped permission tree.
    pub permissions: serde_json::Value,
    /// Expiry timestamp.
    pub expires_at: DateTime<Utc>,
}
