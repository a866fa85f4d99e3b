//! # elevaite-auth
//!
//! Authentication and authorization for elevAIte.
//!
//! ## Modules
//!
//! - `jwt`: access token creation and validation
//! - `apikey`: API key secret generation and verification
//! - `identity`: the principal a request runs as
//! - `rbac`: permission schema index, RBAC validator and permission evaluation

pub mod apikey;
pub mod identity;
pub mod jwt;
pub mod rbac;

pub use apikey::{ApikeySecret, GeneratedApikey};
pub use identity::AuthenticatedEntity;
pub use jwt::{Claims, JwtDecoder, JwtEncoder};
pub use rbac::{RbacSchemas, RbacValidator, RouteScope, ScopeContext, ValidationInfo};
