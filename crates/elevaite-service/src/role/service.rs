//! Account-scoped roles and their assignment to account members.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use elevaite_core::error::AppError;
use elevaite_database::repositories::{
    RoleAssignmentRepository, RoleRepository, UserAccountRepository, UserRepository,
};
use elevaite_entity::permission::{AccountScopedRbacPermission, parse_permissions};
use elevaite_entity::role::{CreateRole, Role, UpdateRole};

use crate::context::MessageResponse;
use crate::dedup_ids;

/// Handles role CRUD and role assignment.
#[derive(Debug, Clone)]
pub struct RoleService {
    roles: Arc<RoleRepository>,
    assignments: Arc<RoleAssignmentRepository>,
    users: Arc<UserRepository>,
    user_accounts: Arc<UserAccountRepository>,
}

/// Whether a role patch adds or removes roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoleAssignmentAction {
    Add,
    Remove,
}

impl RoleService {
    pub fn new(
        roles: Arc<RoleRepository>,
        assignments: Arc<RoleAssignmentRepository>,
        users: Arc<UserRepository>,
        user_accounts: Arc<UserAccountRepository>,
    ) -> Self {
        Self {
            roles,
            assignments,
            users,
            user_accounts,
        }
    }

    /// Creates a role after validating its permission tree.
    pub async fn create_role(&self, data: CreateRole) -> Result<Role, AppError> {
        parse_permissions::<AccountScopedRbacPermission>(&data.permissions)?;
        let role = self.roles.create(&data).await?;
        info!(role_id = %role.id, name = %role.name, "Role created");
        Ok(role)
    }

    pub async fn get_role(&self, role_id: Uuid) -> Result<Role, AppError> {
        self.roles
            .find_by_id(role_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Role - '{role_id}' - not found")))
    }

    pub async fn list_roles(&self) -> Result<Vec<Role>, AppError> {
        self.roles.find_all().await
    }

    /// Applies a partial update; a new permission tree replaces the old one.
    pub async fn update_role(&self, role_id: Uuid, data: UpdateRole) -> Result<Role, AppError> {
        if let Some(permissions) = &data.permissions {
            parse_permissions::<AccountScopedRbacPermission>(permissions)?;
        }
        let role = self.roles.update(role_id, &data).await?;
        info!(role_id = %role_id, "Role updated");
        Ok(role)
    }

    pub async fn delete_role(&self, role_id: Uuid) -> Result<MessageResponse, AppError> {
        if !self.roles.delete(role_id).await? {
            return Err(AppError::not_found(format!("Role - '{role_id}' - not found")));
        }
        info!(role_id = %role_id, "Role deleted");
        Ok(MessageResponse::new(format!(
            "Successfully deleted role - '{role_id}'"
        )))
    }

    /// Adds or removes roles of a regular account member.
    ///
    /// Superadmins and account admins hold no roles.
    pub async fn patch_user_account_roles(
        &self,
        user_id: Uuid,
        account_id: Uuid,
        action: RoleAssignmentAction,
        role_ids: &[Uuid],
    ) -> Result<MessageResponse, AppError> {
        let role_ids = dedup_ids(role_ids);
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User - '{user_id}' - not found")))?;
        if user.is_superadmin {
            return Err(AppError::validation(format!(
                "Invalid action : cannot patch account roles for superadmin user - {user_id}"
            )));
        }
        let membership = self
            .user_accounts
            .find(user_id, account_id)
            .await?
            .ok_or_else(|| {
                AppError::validation(format!(
                    "User - '{user_id}' - is not assigned to account - '{account_id}'"
                ))
            })?;
        if membership.is_admin {
            return Err(AppError::validation(format!(
                "Invalid action : cannot patch account roles for admin user - {user_id}"
            )));
        }

        for role_id in &role_ids {
            if self.roles.find_by_id(*role_id).await?.is_none() {
                return Err(AppError::not_found("one or more roles not found"));
            }
        }

        let mut current: Vec<Uuid> = self
            .roles
            .find_by_user_account(membership.id)
            .await?
            .into_iter()
            .map(|r| r.id)
            .collect();
        let already_assigned = role_ids.iter().filter(|id| current.contains(id)).count();

        let message = match action {
            RoleAssignmentAction::Add => {
                if already_assigned > 0 {
                    return Err(AppError::conflict(format!(
                        "One or more account-scoped roles are already assigned to user - '{user_id}' - in account - '{account_id}'"
                    )));
                }
                current.extend(role_ids.iter().copied());
                format!(
                    "Successfully added {} account-scoped role/(s) to user",
                    role_ids.len()
                )
            }
            RoleAssignmentAction::Remove => {
                if already_assigned != role_ids.len() {
                    return Err(AppError::not_found(format!(
                        "One or more roles to remove were not found for the user - '{user_id}' - in account - '{account_id}'"
                    )));
                }
                current.retain(|id| !role_ids.contains(id));
                format!(
                    "Successfully removed {} account-scoped role/(s) from user",
                    role_ids.len()
                )
            }
        };

        self.assignments.replace(membership.id, &current).await?;
        info!(
            user_id = %user_id,
            account_id = %account_id,
            action = ?action,
            count = role_ids.len(),
            "Account roles patched"
        );
        Ok(MessageResponse::new(message))
    }
}
