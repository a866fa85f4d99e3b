//! Project management and project membership services.

pub mod service;

pub use service::{CreateProjectRequest, ProjectService};
