//! Request-scoped persistence used by RBAC validation.
//!
//! A validation runs inside one [`RbacStore`] session. The session is
//! committed when validation succeeds and rolled back otherwise; the
//! caller owns that decision.

pub mod postgres;

#[cfg(any(test, feature = "test-support"))]
pub mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use elevaite_core::AppResult;
use elevaite_entity::association::{UserAccount, UserProject};
use elevaite_entity::{ModelKind, Resource};

pub use postgres::{PgRbacStore, PgRbacStoreProvider};

/// Reads needed to authorize a request.
#[async_trait]
pub trait RbacStore: Send + Sync {
    /// Load a row of any RBAC-relevant model.
    async fn find_resource(&self, kind: ModelKind, id: Uuid) -> AppResult<Option<Resource>>;

    /// A user's membership in an account.
    async fn find_user_account(
        &self,
        user_id: Uuid,
        account_id: Uuid,
    ) -> AppResult<Option<UserAccount>>;

    /// A user's membership in a project.
    async fn find_user_project(
        &self,
        user_id: Uuid,
        project_id: Uuid,
    ) -> AppResult<Option<UserProject>>;

    /// Whether the user is a member of `project_id` and of every ancestor.
    async fn is_assigned_to_project_chain(&self, user_id: Uuid, project_id: Uuid)
    -> AppResult<bool>;

    /// Whether any role assigned through the membership holds `"Allow"` at
    /// the given key path of its permissions.
    async fn role_allows(&self, user_account_id: Uuid, path: &[String]) -> AppResult<bool>;

    /// Make the session's work durable and end it.
    async fn commit(&self) -> AppResult<()>;

    /// Discard the session's work and end it.
    async fn rollback(&self) -> AppResult<()>;
}

/// Opens RBAC sessions.
#[async_trait]
pub trait RbacStoreProvider: Send + Sync {
    /// Start a new session.
    async fn begin(&self) -> AppResult<Box<dyn RbacStore>>;
}

/// Value at a key path of a JSON object, if every segment exists.
pub fn value_at_path<'a>(
    value: &'a serde_json::Value,
    path: &[String],
) -> Option<&'a serde_json::Value> {
    path.iter().try_fold(value, |node, key| node.get(key))
}
