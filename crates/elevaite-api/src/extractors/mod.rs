//! Custom Axum extractors.

pub mod auth;
pub mod json;

pub use auth::AuthType;
pub use json::{JsonBody, ValidJson};
