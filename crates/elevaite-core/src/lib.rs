//! # elevaite-core
//!
//! Core crate for the elevAIte RBAC service. Contains configuration
//! schemas and the unified error system.
//!
//! This crate has **no** internal dependencies on other elevAIte crates.

pub mod config;
pub mod error;
pub mod result;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
