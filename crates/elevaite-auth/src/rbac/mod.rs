//! RBAC permission validation and evaluation.
//!
//! Permissions are checked against three scoped trees indexed once at
//! startup ([`RbacSchemas`]). Role permissions grant, project overrides
//! deny, and API key permissions narrow.

pub mod context;
pub mod evaluate;
pub mod info;
mod messages;
pub mod schema;
pub mod validator;

#[cfg(test)]
mod tests;

pub use context::{RouteScope, ScopeContext};
pub use info::{TypeDenial, ValidationInfo, type_denial_key};
pub use schema::{RbacSchemas, SchemaIndex, SchemaIndexError};
pub use validator::RbacValidator;
