//! User administration and profile services.

pub mod service;

pub use service::{AccountMembership, UserProfile, UserService};
