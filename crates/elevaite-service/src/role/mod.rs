//! Role management and role assignment services.

pub mod service;

pub use service::{RoleAssignmentAction, RoleService};
