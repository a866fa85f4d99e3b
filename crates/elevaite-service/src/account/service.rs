//! Accounts and their members.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use elevaite_core::error::AppError;
use elevaite_database::repositories::{
    AccountRepository, RoleRepository, UserAccountRepository, UserRepository,
};
use elevaite_entity::account::{Account, CreateAccount, UpdateAccount};
use elevaite_entity::role::Role;
use elevaite_entity::user::User;

use crate::context::{AdminAction, MessageResponse, RequestContext};
use crate::dedup_ids;

/// Handles account CRUD and account membership.
#[derive(Debug, Clone)]
pub struct AccountService {
    accounts: Arc<AccountRepository>,
    users: Arc<UserRepository>,
    user_accounts: Arc<UserAccountRepository>,
    roles: Arc<RoleRepository>,
}

/// One row of an account's user list.
#[derive(Debug, Clone, Serialize)]
pub struct AccountUser {
    #[serde(flatten)]
    pub user: User,
    pub is_account_admin: bool,
    /// Empty for admins and superadmins, whose roles are moot.
    pub roles: Vec<Role>,
}

/// Case-insensitive substring filters for an account's user list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountUserFilter {
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
}

impl AccountUserFilter {
    fn matches(&self, user: &User) -> bool {
        fn contains(haystack: Option<&str>, needle: &Option<String>) -> bool {
            match needle {
                Some(needle) => haystack
                    .is_some_and(|h| h.to_lowercase().contains(&needle.to_lowercase())),
                None => true,
            }
        }
        contains(user.firstname.as_deref(), &self.firstname)
            && contains(user.lastname.as_deref(), &self.lastname)
            && contains(Some(&user.email), &self.email)
    }
}

impl AccountService {
    pub fn new(
        accounts: Arc<AccountRepository>,
        users: Arc<UserRepository>,
        user_accounts: Arc<UserAccountRepository>,
        roles: Arc<RoleRepository>,
    ) -> Self {
        Self {
            accounts,
            users,
            user_accounts,
            roles,
        }
    }

    /// Creates an account and makes the creator a member of it.
    pub async fn create_account(
        &self,
        ctx: &RequestContext,
        data: CreateAccount,
    ) -> Result<Account, AppError> {
        let creator = ctx.require_user()?;
        let account = self.accounts.create(&data).await?;
        self.user_accounts
            .create(creator.id, account.id, false)
            .await?;

        info!(account_id = %account.id, creator_id = %creator.id, "Account created");
        Ok(account)
    }

    /// Accounts visible to the actor, optionally filtered by name.
    ///
    /// Superadmins see every account, others only those they belong to.
    pub async fn list_accounts(
        &self,
        ctx: &RequestContext,
        name: Option<&str>,
    ) -> Result<Vec<Account>, AppError> {
        let accounts = if ctx.is_superadmin() {
            self.accounts.find_all().await?
        } else {
            self.accounts.find_for_user(ctx.actor_id()).await?
        };
        Ok(match name {
            Some(name) => {
                let needle = name.to_lowercase();
                accounts
                    .into_iter()
                    .filter(|a| a.name.to_lowercase().contains(&needle))
                    .collect()
            }
            None => accounts,
        })
    }

    pub async fn update_account(
        &self,
        account_id: Uuid,
        data: UpdateAccount,
    ) -> Result<Account, AppError> {
        let account = self.accounts.update(account_id, &data).await?;
        info!(account_id = %account_id, "Account updated");
        Ok(account)
    }

    /// Members of an account with their admin flag and roles.
    pub async fn list_account_users(
        &self,
        account_id: Uuid,
        filter: &AccountUserFilter,
    ) -> Result<Vec<AccountUser>, AppError> {
        let memberships = self.user_accounts.find_by_account(account_id).await?;
        let users = self.users.find_by_account(account_id).await?;

        let mut result = Vec::with_capacity(users.len());
        for user in users.into_iter().filter(|u| filter.matches(u)) {
            let Some(membership) = memberships.iter().find(|m| m.user_id == user.id) else {
                continue;
            };
            let roles = if user.is_superadmin || membership.is_admin {
                Vec::new()
            } else {
                self.roles.find_by_user_account(membership.id).await?
            };
            result.push(AccountUser {
                is_account_admin: membership.is_admin,
                user,
                roles,
            });
        }
        Ok(result)
    }

    /// Adds users to an account as regular members.
    pub async fn assign_users(
        &self,
        account_id: Uuid,
        user_ids: &[Uuid],
    ) -> Result<MessageResponse, AppError> {
        let user_ids = dedup_ids(user_ids);
        let found = self.users.find_by_ids(&user_ids).await?;
        if found.len() != user_ids.len() {
            return Err(AppError::not_found("One or more users not found"));
        }
        if self
            .user_accounts
            .count_members(account_id, &user_ids)
            .await?
            > 0
        {
            return Err(AppError::conflict(format!(
                "One or more users are already assigned to account - '{account_id}'"
            )));
        }
        for user_id in &user_ids {
            self.user_accounts.create(*user_id, account_id, false).await?;
        }

        info!(account_id = %account_id, count = user_ids.len(), "Users assigned to account");
        Ok(MessageResponse::new(format!(
            "Successfully assigned {} user/(s) to account - '{account_id}'",
            user_ids.len()
        )))
    }

    /// Removes a user from an account and from all of its projects.
    pub async fn deassign_user(
        &self,
        ctx: &RequestContext,
        account_id: Uuid,
        user_id: Uuid,
    ) -> Result<MessageResponse, AppError> {
        let target = self.find_user(user_id).await?;
        if self.user_accounts.find(user_id, account_id).await?.is_none() {
            return Err(AppError::validation(format!(
                "User - '{user_id}' - is not assigned to account - '{account_id}'"
            )));
        }
        if ctx.actor_id() == user_id && !ctx.is_superadmin() {
            return Err(AppError::validation(
                "Invalid action - cannot deassign self from account",
            ));
        }
        if target.is_superadmin && ctx.actor_id() != user_id && !ctx.is_superadmin() {
            return Err(AppError::authorization(format!(
                "you do not have superadmin permissions to deassign superadmin user - '{user_id}' from account - '{account_id}'"
            )));
        }

        self.user_accounts.delete(user_id, account_id).await?;
        info!(account_id = %account_id, user_id = %user_id, "User deassigned from account");
        Ok(MessageResponse::new(format!(
            "Successfully deassigned user - '{user_id}' - from account - '{account_id}'"
        )))
    }

    /// Grants or revokes account admin status.
    pub async fn set_account_admin(
        &self,
        ctx: &RequestContext,
        account_id: Uuid,
        user_id: Uuid,
        action: AdminAction,
    ) -> Result<MessageResponse, AppError> {
        self.find_user(user_id).await?;
        if self.user_accounts.find(user_id, account_id).await?.is_none() {
            return Err(AppError::validation(format!(
                "user - '{user_id}' - is not assigned to account - '{account_id}'"
            )));
        }
        if ctx.actor_id() == user_id && !ctx.is_superadmin() {
            return Err(AppError::authorization(
                "you do not have permission to modify account admin status of self",
            ));
        }

        self.user_accounts
            .set_admin(user_id, account_id, action.is_grant())
            .await?;
        info!(
            account_id = %account_id,
            user_id = %user_id,
            action = ?action,
            "Account admin status changed"
        );
        Ok(MessageResponse::new(format!(
            "Admin status successfully {}",
            action.past_tense()
        )))
    }

    async fn find_user(&self, user_id: Uuid) -> Result<User, AppError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User - '{user_id}' - not found")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(firstname: Option<&str>, email: &str) -> User {
        User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            firstname: firstname.map(str::to_string),
            lastname: None,
            is_superadmin: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_user_filter() {
        let ada = user(Some("Ada"), "ada@acme.test");
        let anon = user(None, "anon@acme.test");

        let filter = AccountUserFilter {
            firstname: Some("aD".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&ada));
        assert!(!filter.matches(&anon));

        let filter = AccountUserFilter {
            email: Some("ACME".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&ada));
        assert!(filter.matches(&anon));
        assert!(AccountUserFilter::default().matches(&anon));
    }
}
