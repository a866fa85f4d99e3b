//! Scoped permission trees.
//!
//! Permission objects are trees of `ENTITY_`, `TYPENAMES_`, `TYPEVALUES_`
//! and `ACTION_` keys whose leaves are presence markers rather than
//! booleans. Three scopes share the key layout:
//!
//! * account scope (role permissions): leaves are `"Allow"`
//! * project scope (user-project overrides): leaves are `"Deny"`
//! * apikey scope (apikey permissions): leaves are `"Allow"`
//!
//! Every node rejects unknown keys, and every node made only of optional
//! fields rejects an all-null body.

mod macros;

pub mod account;
pub mod apikey;
pub mod evaluation;
pub mod mapper;
pub mod marker;
pub mod project;
pub mod scope;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

pub use account::AccountScopedRbacPermission;
pub use apikey::ApikeyScopedRbacPermission;
pub use mapper::{ScopeMappingError, map_to_apikey_scoped_permissions};
pub use marker::{Allow, Deny};
pub use project::ProjectScopedRbacPermission;
pub use scope::RbacPermissionScope;

/// Key prefix naming an entity (`ENTITY_Project`).
pub const ENTITY_PREFIX: &str = "ENTITY_";
/// Key prefix naming the type attributes of an entity (`TYPENAMES_applicationType`).
pub const TYPENAMES_PREFIX: &str = "TYPENAMES_";
/// Key prefix naming one combination of type values (`TYPEVALUES_ingest`).
pub const TYPEVALUES_PREFIX: &str = "TYPEVALUES_";
/// Key prefix naming an action (`ACTION_READ`).
pub const ACTION_PREFIX: &str = "ACTION_";
/// Separator between multiple type names or type values in one key.
pub const TYPE_SEPARATOR: &str = "__";

/// Structural errors in a permission object.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermissionSchemaError {
    /// The JSON does not match the node layout (unknown key, wrong marker,
    /// missing required field).
    #[error("malformed permissions object: {0}")]
    Malformed(String),
    /// A node with only optional fields had every field null.
    #[error("{path}: At least one field from - {fields} must be provided")]
    EmptyNode {
        /// Dotted key path of the offending node.
        path: String,
        /// The node's fields, quoted and comma separated.
        fields: String,
    },
}

impl From<PermissionSchemaError> for elevaite_core::AppError {
    fn from(err: PermissionSchemaError) -> Self {
        elevaite_core::AppError::validation(err.to_string())
    }
}

/// A node of a scoped permission tree.
pub trait PermissionNode: Serialize + DeserializeOwned + Sized {
    /// Node with every field this scope allows populated.
    fn create() -> Self;

    /// Check the node and its children, tracking the key path in `path`.
    fn validate_at(&self, path: &mut Vec<&'static str>) -> Result<(), PermissionSchemaError>;

    /// Check the node and its children.
    fn validate(&self) -> Result<(), PermissionSchemaError> {
        self.validate_at(&mut Vec::new())
    }
}

/// Deserialize and validate a permission object of the given scope.
pub fn parse_permissions<T: PermissionNode>(
    value: &serde_json::Value,
) -> Result<T, PermissionSchemaError> {
    let node: T = serde_json::from_value(value.clone())
        .map_err(|e| PermissionSchemaError::Malformed(e.to_string()))?;
    node.validate()?;
    Ok(node)
}

/// JSON form of a fully populated tree.
pub fn full_tree<T: PermissionNode>() -> serde_json::Value {
    serde_json::to_value(T::create()).unwrap_or(serde_json::Value::Null)
}
