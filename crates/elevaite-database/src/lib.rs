//! # elevaite-database
//!
//! PostgreSQL connection management, repositories for every elevAIte
//! entity, and the transactional store the RBAC validator reads from.

pub mod connection;
pub mod migration;
pub mod rbac;
pub mod repositories;

pub use connection::DatabasePool;
pub use rbac::{RbacStore, RbacStoreProvider};
