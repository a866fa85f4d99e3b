//! # elevaite-entity
//!
//! Domain entity models for elevAIte RBAC. Every struct in this crate
//! represents a database table row or a domain value object; database
//! entities derive `sqlx::FromRow`.
//!
//! The [`permission`] module holds the three scoped permission trees that
//! roles, project overrides and API keys store, plus the request/response
//! types of permission evaluation.

pub mod account;
pub mod apikey;
pub mod application;
pub mod association;
pub mod collection;
pub mod dataset;
pub mod permission;
pub mod project;
pub mod resource;
pub mod role;
pub mod user;

pub use resource::{ModelKind, Resource};
