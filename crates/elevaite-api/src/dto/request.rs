//! Request DTOs with validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use elevaite_entity::apikey::ApikeyPermissionsType;
use elevaite_service::{AdminAction, RoleAssignmentAction};

/// Create account request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateAccountRequest {
    #[validate(length(min = 1, max = 255, message = "name must be 1 to 255 characters"))]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

/// Partial account update.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PatchAccountRequest {
    #[validate(length(min = 1, max = 255, message = "name must be 1 to 255 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

/// Users to add to an account or project.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UserIdsRequest {
    #[validate(length(min = 1, message = "at least one user id is required"))]
    pub user_ids: Vec<Uuid>,
}

/// Grant or revoke an admin flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminActionRequest {
    pub action: AdminAction,
}

/// Create role request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateRoleRequest {
    #[validate(length(min = 1, max = 255, message = "name must be 1 to 255 characters"))]
    pub name: String,
    pub permissions: Value,
}

/// Partial role update.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PatchRoleRequest {
    #[validate(length(min = 1, max = 255, message = "name must be 1 to 255 characters"))]
    pub name: Option<String>,
    pub permissions: Option<Value>,
}

/// Create user request (superadmin).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[validate(length(max = 255))]
    pub firstname: Option<String>,
    #[validate(length(max = 255))]
    pub lastname: Option<String>,
}

/// Add or remove roles of a user in an account.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RoleAssignmentRequest {
    pub action: RoleAssignmentAction,
    #[validate(length(min = 1, message = "at least one role id is required"))]
    pub role_ids: Vec<Uuid>,
}

/// Create project request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 255, message = "name must be 1 to 255 characters"))]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

/// Create API key request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateApikeyRequest {
    #[validate(length(min = 1, max = 255, message = "name must be 1 to 255 characters"))]
    pub name: String,
    pub permissions_type: ApikeyPermissionsType,
    pub permissions: Option<Value>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Named project resource (dataset, collection).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NamedResourceRequest {
    #[validate(length(min = 1, max = 255, message = "name must be 1 to 255 characters"))]
    pub name: String,
}

/// Tags to add to a dataset.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TagDatasetRequest {
    #[validate(length(min = 1, message = "at least one tag is required"))]
    pub tags: Vec<String>,
}

/// Create configuration request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateConfigurationRequest {
    #[validate(length(min = 1, max = 255, message = "name must be 1 to 255 characters"))]
    pub name: String,
    #[serde(default)]
    pub is_template: bool,
    pub raw: Value,
}

/// Partial configuration update.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateConfigurationRequest {
    #[validate(length(min = 1, max = 255, message = "name must be 1 to 255 characters"))]
    pub name: Option<String>,
    pub is_template: Option<bool>,
    pub raw: Option<Value>,
}

/// Create instance request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateInstanceRequest {
    #[validate(length(min = 1, max = 255, message = "name must be 1 to 255 characters"))]
    pub name: String,
    pub configuration_id: Uuid,
}

/// Filters of `GET /accounts`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountListQuery {
    pub name: Option<String>,
}

/// Filters of `GET /projects`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectListQuery {
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_user_requires_valid_email() {
        let req = CreateUserRequest {
            email: "not-an-email".to_string(),
            firstname: None,
            lastname: None,
        };
        assert!(req.validate().is_err());

        let req = CreateUserRequest {
            email: "ada@acme.test".to_string(),
            ..req
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_empty_lists_rejected() {
        let req = UserIdsRequest { user_ids: vec![] };
        assert!(req.validate().is_err());
        let req = TagDatasetRequest { tags: vec![] };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_admin_action_names() {
        let req: AdminActionRequest = serde_json::from_value(serde_json::json!({ "action": "Grant" })).unwrap();
        assert_eq!(req.action, AdminAction::Grant);
    }
}
