//! Repository implementations for all elevAIte entities.

pub mod account;
pub mod apikey;
pub mod application;
pub mod association;
pub mod dataset;
pub mod project;
pub mod role;
pub mod user;

pub use account::AccountRepository;
pub use apikey::ApikeyRepository;
pub use application::{ApplicationRepository, ConfigurationRepository, InstanceRepository};
pub use association::{RoleAssignmentRepository, UserAccountRepository, UserProjectRepository};
pub use dataset::{CollectionRepository, DatasetRepository};
pub use project::ProjectRepository;
pub use role::RoleRepository;
pub use user::UserRepository;

use elevaite_core::error::{AppError, ErrorKind};

/// Map a sqlx error, turning a violation of `constraint` into a conflict.
pub(crate) fn map_unique_violation(
    err: sqlx::Error,
    constraint: &str,
    conflict_message: impl Into<String>,
    context: &'static str,
) -> AppError {
    match err {
        sqlx::Error::Database(ref db_err) if db_err.constraint() == Some(constraint) => {
            AppError::conflict(conflict_message)
        }
        other => AppError::with_source(ErrorKind::Database, context, other),
    }
}
