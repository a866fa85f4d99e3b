//! Request context carrying the authenticated entity and its memberships.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use elevaite_auth::{AuthenticatedEntity, ValidationInfo};
use elevaite_core::AppError;
use elevaite_entity::association::{UserAccount, UserProject};
use elevaite_entity::user::User;

/// Context for the current authorized request.
///
/// Built from the outcome of RBAC validation and passed into service
/// methods so that every operation knows *who* is acting and with which
/// account/project memberships.
#[derive(Debug, Clone, Serialize)]
pub struct RequestContext {
    /// The authenticated user or API key.
    pub entity: AuthenticatedEntity,
    /// Membership in the account in scope, if any.
    pub user_account: Option<UserAccount>,
    /// Membership in the project in scope, if any.
    pub user_project: Option<UserProject>,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a context from a passed validation.
    pub fn from_validation(info: &ValidationInfo) -> Self {
        Self {
            entity: info.entity.clone(),
            user_account: info.user_account.clone(),
            user_project: info.user_project.clone(),
            request_time: Utc::now(),
        }
    }

    /// Creates a context for a user with no memberships in scope.
    pub fn for_user(user: User) -> Self {
        Self {
            entity: AuthenticatedEntity::User(user),
            user_account: None,
            user_project: None,
            request_time: Utc::now(),
        }
    }

    /// Id of the acting user or API key.
    pub fn actor_id(&self) -> Uuid {
        self.entity.id()
    }

    pub fn is_superadmin(&self) -> bool {
        self.entity.is_superadmin()
    }

    pub fn is_account_admin(&self) -> bool {
        self.user_account.as_ref().is_some_and(|ua| ua.is_admin)
    }

    pub fn is_project_admin(&self) -> bool {
        self.user_project.as_ref().is_some_and(|up| up.is_admin)
    }

    /// Superadmin or admin of the account in scope.
    pub fn is_privileged(&self) -> bool {
        self.is_superadmin() || self.is_account_admin()
    }

    /// Privileged, or admin of the project in scope.
    pub fn manages_project(&self) -> bool {
        self.is_privileged() || self.is_project_admin()
    }

    /// The acting user; API keys cannot perform user-only operations.
    pub fn require_user(&self) -> Result<&User, AppError> {
        self.entity
            .as_user()
            .ok_or_else(|| AppError::authorization("this operation requires a user access token"))
    }
}

/// Grant or revoke an admin or superadmin flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdminAction {
    Grant,
    Revoke,
}

impl AdminAction {
    pub fn is_grant(self) -> bool {
        matches!(self, Self::Grant)
    }

    /// Past tense, for response messages.
    pub fn past_tense(self) -> &'static str {
        match self {
            Self::Grant => "granted",
            Self::Revoke => "revoked",
        }
    }
}

/// Response body of operations that return only a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(is_superadmin: bool) -> User {
        User {
            id: Uuid::new_v4(),
            email: "someone@acme.test".to_string(),
            firstname: None,
            lastname: None,
            is_superadmin,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_privilege_levels() {
        let member = user(false);
        let mut ctx = RequestContext::for_user(member.clone());
        assert!(!ctx.is_privileged());
        assert!(!ctx.manages_project());

        ctx.user_project = Some(UserProject {
            id: Uuid::new_v4(),
            user_id: member.id,
            project_id: Uuid::new_v4(),
            is_admin: true,
            permission_overrides: serde_json::json!({}),
        });
        assert!(!ctx.is_privileged());
        assert!(ctx.manages_project());

        let ctx = RequestContext::for_user(user(true));
        assert!(ctx.is_privileged());
        assert!(ctx.require_user().is_ok());
    }

    #[test]
    fn test_admin_action_wire_names() {
        let action: AdminAction = serde_json::from_str("\"Revoke\"").unwrap();
        assert_eq!(action, AdminAction::Revoke);
        assert_eq!(action.past_tense(), "revoked");
        assert!(serde_json::from_str::<AdminAction>("\"Promote\"").is_err());
    }
}
