//! # elevaite-api
//!
//! HTTP API layer for elevAIte RBAC built on Axum.
//!
//! Provides the REST endpoints, route validators (authentication plus RBAC
//! checks run as extractors), middleware (CORS, logging, compression,
//! timeouts), request DTOs, and error mapping.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod session;
pub mod state;
pub mod validators;

pub use app::{build_app, run_server};
pub use error::{ApiError, ApiErrorResponse, ApiResult};
pub use state::AppState;
