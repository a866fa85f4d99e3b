//! Membership rows linking users to accounts, projects and roles.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A user's membership in an account.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserAccount {
    /// Association identifier.
    pub id: Uuid,
    /// Member user.
    pub user_id: Uuid,
    /// Account joined.
    pub account_id: Uuid,
    /// Account admins pass every check inside the account.
    pub is_admin: bool,
}

/// A user's membership in a project.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserProject {
    /// Association identifier.
    pub id: Uuid,
    /// Member user.
    pub user_id: Uuid,
    /// Project joined.
    pub project_id: Uuid,
    /// Project admins carry no permission overrides.
    pub is_admin: bool,
    /// Project-scoped `"Deny"` overrides layered over the user's roles.
    pub permission_overrides: serde_json::Value,
}

/// Assignment of a role to a user within an account.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RoleUserAccount {
    /// Assignment identifier.
    pub id: Uuid,
    /// Role granted.
    pub role_id: Uuid,
    /// Account membership receiving the role.
    pub user_account_id: Uuid,
}
