//! User creation, profiles, superadmin status and project permission overrides.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use elevaite_core::error::AppError;
use elevaite_database::repositories::{
    AccountRepository, RoleRepository, UserAccountRepository, UserProjectRepository,
    UserRepository,
};
use elevaite_entity::association::{UserAccount, UserProject};
use elevaite_entity::permission::{ProjectScopedRbacPermission, parse_permissions};
use elevaite_entity::role::Role;
use elevaite_entity::user::{CreateUser, User};

use crate::context::{AdminAction, MessageResponse, RequestContext};

/// Handles user administration.
#[derive(Debug, Clone)]
pub struct UserService {
    users: Arc<UserRepository>,
    accounts: Arc<AccountRepository>,
    roles: Arc<RoleRepository>,
    user_accounts: Arc<UserAccountRepository>,
    user_projects: Arc<UserProjectRepository>,
}

/// A user with the account memberships the viewer may see.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: User,
    pub account_memberships: Vec<AccountMembership>,
}

/// One account membership in a [`UserProfile`].
#[derive(Debug, Clone, Serialize)]
pub struct AccountMembership {
    pub account_id: Uuid,
    pub account_name: String,
    pub is_admin: bool,
    pub roles: Vec<Role>,
}

impl UserService {
    pub fn new(
        users: Arc<UserRepository>,
        accounts: Arc<AccountRepository>,
        roles: Arc<RoleRepository>,
        user_accounts: Arc<UserAccountRepository>,
        user_projects: Arc<UserProjectRepository>,
    ) -> Self {
        Self {
            users,
            accounts,
            roles,
            user_accounts,
            user_projects,
        }
    }

    pub async fn create_user(&self, data: CreateUser) -> Result<User, AppError> {
        let user = self.users.create(&data).await?;
        info!(user_id = %user.id, "User created");
        Ok(user)
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<User, AppError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User - '{user_id}' - not found")))
    }

    /// Profile of `user_id` as seen by the actor.
    ///
    /// Superadmins see every membership; others only memberships in
    /// accounts they share with the user. With `account_id` the user must
    /// belong to that account.
    pub async fn get_profile(
        &self,
        ctx: &RequestContext,
        user_id: Uuid,
        account_id: Option<Uuid>,
    ) -> Result<UserProfile, AppError> {
        let user = self.get_user(user_id).await?;
        let memberships = self.user_accounts.find_by_user(user_id).await?;

        if let Some(account_id) = account_id {
            if !memberships.iter().any(|m| m.account_id == account_id) {
                return Err(AppError::validation(format!(
                    "User - '{user_id}' - is not assigned to account - '{account_id}'"
                )));
            }
        }

        let visible: Vec<UserAccount> = if ctx.is_superadmin() || ctx.actor_id() == user_id {
            memberships
        } else {
            let shared: Vec<Uuid> = self
                .user_accounts
                .find_by_user(ctx.actor_id())
                .await?
                .into_iter()
                .map(|m| m.account_id)
                .collect();
            memberships
                .into_iter()
                .filter(|m| shared.contains(&m.account_id))
                .collect()
        };

        let mut account_memberships = Vec::with_capacity(visible.len());
        for membership in visible {
            let Some(account) = self.accounts.find_by_id(membership.account_id).await? else {
                continue;
            };
            let roles = if user.is_superadmin || membership.is_admin {
                Vec::new()
            } else {
                self.roles.find_by_user_account(membership.id).await?
            };
            account_memberships.push(AccountMembership {
                account_id: account.id,
                account_name: account.name,
                is_admin: membership.is_admin,
                roles,
            });
        }

        Ok(UserProfile {
            user,
            account_memberships,
        })
    }

    /// Grants or revokes superadmin status of another user.
    pub async fn set_superadmin(
        &self,
        ctx: &RequestContext,
        user_id: Uuid,
        action: AdminAction,
    ) -> Result<MessageResponse, AppError> {
        if ctx.actor_id() == user_id {
            return Err(AppError::validation(
                "Invalid action - cannot update superadmin status of self",
            ));
        }
        self.get_user(user_id).await?;
        self.users.set_superadmin(user_id, action.is_grant()).await?;

        info!(user_id = %user_id, action = ?action, "Superadmin status changed");
        Ok(MessageResponse::new(format!(
            "superadmin status successfully {}",
            action.past_tense()
        )))
    }

    /// Current permission overrides of a regular project member.
    pub async fn get_permission_overrides(
        &self,
        user_id: Uuid,
        account_id: Uuid,
        project_id: Uuid,
    ) -> Result<Value, AppError> {
        let membership = self
            .overridable_membership(user_id, account_id, project_id, "get")
            .await?;
        Ok(membership.permission_overrides)
    }

    /// Replaces the permission overrides of a regular project member.
    ///
    /// Null fields are dropped before storing.
    pub async fn update_permission_overrides(
        &self,
        user_id: Uuid,
        account_id: Uuid,
        project_id: Uuid,
        overrides: &Value,
    ) -> Result<MessageResponse, AppError> {
        let parsed = parse_permissions::<ProjectScopedRbacPermission>(overrides)?;
        self.overridable_membership(user_id, account_id, project_id, "update")
            .await?;

        let stored = serde_json::to_value(&parsed)?;
        self.user_projects
            .update_overrides(user_id, project_id, &stored)
            .await?;

        info!(user_id = %user_id, project_id = %project_id, "Permission overrides updated");
        Ok(MessageResponse::new(
            "Project permission overrides successfully updated for user",
        ))
    }

    async fn overridable_membership(
        &self,
        user_id: Uuid,
        account_id: Uuid,
        project_id: Uuid,
        verb: &str,
    ) -> Result<UserProject, AppError> {
        let user = self.get_user(user_id).await?;
        let account_membership = self
            .user_accounts
            .find(user_id, account_id)
            .await?
            .ok_or_else(|| {
                AppError::validation(format!(
                    "user - '{user_id}' - is not assigned to account - '{account_id}'"
                ))
            })?;
        let project_membership = self
            .user_projects
            .find(user_id, project_id)
            .await?
            .ok_or_else(|| {
                AppError::validation(format!(
                    "user - '{user_id}' - is not assigned to project - '{project_id}'"
                ))
            })?;
        if project_membership.is_admin || account_membership.is_admin || user.is_superadmin {
            return Err(AppError::validation(format!(
                "Invalid action - Attempting to {verb} project permission overrides for user - '{user_id}' - who is admin/superadmin/project-admin"
            )));
        }
        Ok(project_membership)
    }
}
