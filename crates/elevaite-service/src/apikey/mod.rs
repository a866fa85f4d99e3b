//! API key issuance and management.

pub mod permissions;
pub mod service;

pub use permissions::clone_permissions;
pub use service::{ApikeyService, CreateApikeyRequest, CreatedApikey};
