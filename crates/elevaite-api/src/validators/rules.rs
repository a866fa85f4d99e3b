//! Authorization rules of every protected endpoint.

use elevaite_auth::{RouteScope, ScopeContext, ValidationInfo};
use elevaite_core::{AppError, AppResult};
use elevaite_entity::ModelKind;

use super::{Check, RouteRule};
use crate::extractors::auth::AuthType;

/// Declare a zero-sized rule type.
macro_rules! route_rule {
    (
        $(#[$meta:meta])*
        $name:ident, $scope:expr, $auth:expr, $check:expr $(, post = $post:path)?
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        pub struct $name;

        impl RouteRule for $name {
            const NAME: &'static str = stringify!($name);
            const SCOPE: RouteScope = $scope;
            const AUTH: AuthType = $auth;
            const CHECK: Check = $check;

            $(
                fn post_check(info: &ValidationInfo, scope: &ScopeContext) -> AppResult<()> {
                    $post(info, scope)
                }
            )?
        }
    };
}

const fn permission(target: ModelKind, actions: &'static [&'static str]) -> Check {
    Check::Permission { target, actions }
}

const fn scoped(target: ModelKind) -> Check {
    Check::Scope { target }
}

const READ: &[&str] = &["READ"];
const CREATE: &[&str] = &["CREATE"];
const UPDATE: &[&str] = &["UPDATE"];
const TAG: &[&str] = &["TAG"];
const CONFIGURATION_READ: &[&str] = &["CONFIGURATION", "READ"];

// ── Accounts ────────────────────────────────────────────────

route_rule!(CreateAccount, RouteScope::NONE, AuthType::AccessToken, Check::Authentication, post = superadmin_creates_accounts);
route_rule!(ListAccounts, RouteScope::NONE, AuthType::AccessToken, Check::Authentication);
route_rule!(ReadAccount, RouteScope::ACCOUNT, AuthType::AccessToken, scoped(ModelKind::Account));
route_rule!(PatchAccount, RouteScope::ACCOUNT, AuthType::AccessToken, scoped(ModelKind::Account), post = admin_patches_account);
route_rule!(
    /// Assigning and removing account members.
    ManageAccountUsers, RouteScope::ACCOUNT, AuthType::AccessToken, scoped(ModelKind::Account), post = admin_manages_account_users
);
route_rule!(UpdateAccountAdmin, RouteScope::ACCOUNT, AuthType::AccessToken, scoped(ModelKind::Account), post = admin_updates_account_admin);

// ── Roles ───────────────────────────────────────────────────

route_rule!(ReadRoles, RouteScope::NONE, AuthType::AccessToken, Check::Authentication);
route_rule!(ManageRoles, RouteScope::NONE, AuthType::AccessToken, Check::Authentication, post = superadmin_manages_roles);

// ── Users ───────────────────────────────────────────────────

route_rule!(CreateUser, RouteScope::NONE, AuthType::AccessToken, Check::Authentication, post = superadmin_creates_users);
route_rule!(
    /// Profile of the path user, optionally within the account header.
    ReadUserProfile, RouteScope::ACCOUNT, AuthType::AccessToken, scoped(ModelKind::User)
);
route_rule!(UpdateSuperadmin, RouteScope::NONE, AuthType::AccessToken, scoped(ModelKind::User), post = superadmin_updates_superadmin);
route_rule!(PatchUserAccountRoles, RouteScope::ACCOUNT, AuthType::AccessToken, scoped(ModelKind::User), post = admin_updates_user_roles);
route_rule!(ReadPermissionOverrides, RouteScope::PROJECT, AuthType::AccessToken, scoped(ModelKind::User), post = admin_reads_overrides);
route_rule!(UpdatePermissionOverrides, RouteScope::PROJECT, AuthType::AccessToken, scoped(ModelKind::User), post = admin_updates_overrides);

// ── Projects ────────────────────────────────────────────────

route_rule!(
    /// The project header names the parent of the new project.
    CreateProject, RouteScope::ACCOUNT_AND_PROJECT, AuthType::AccessToken, permission(ModelKind::Project, CREATE)
);
route_rule!(ListProjects, RouteScope::ACCOUNT_AND_PROJECT, AuthType::AccessToken, permission(ModelKind::Project, READ));
route_rule!(ReadProject, RouteScope::PROJECT, AuthType::AccessToken, permission(ModelKind::Project, READ));
route_rule!(AssignProjectUsers, RouteScope::PROJECT, AuthType::AccessToken, permission(ModelKind::Project, READ), post = admin_assigns_project_users);
route_rule!(DeassignProjectUser, RouteScope::PROJECT, AuthType::AccessToken, permission(ModelKind::Project, READ), post = self_or_admin_deassigns_project_user);
route_rule!(UpdateProjectAdmin, RouteScope::PROJECT, AuthType::AccessToken, permission(ModelKind::Project, READ), post = admin_updates_project_admin);

// ── API keys ────────────────────────────────────────────────

route_rule!(CreateApikey, RouteScope::PROJECT, AuthType::AccessToken, permission(ModelKind::Apikey, CREATE));
route_rule!(
    /// Listing, reading and revoking keys.
    ReadApikeys, RouteScope::PROJECT, AuthType::AccessToken, permission(ModelKind::Apikey, READ)
);

// ── Datasets and collections ────────────────────────────────

route_rule!(ReadDatasets, RouteScope::PROJECT, AuthType::AccessTokenOrApiKey, permission(ModelKind::Dataset, READ));
route_rule!(CreateDataset, RouteScope::PROJECT, AuthType::AccessTokenOrApiKey, permission(ModelKind::Project, READ), post = admin_creates_dataset);
route_rule!(TagDataset, RouteScope::PROJECT, AuthType::AccessTokenOrApiKey, permission(ModelKind::Dataset, TAG));
route_rule!(ReadCollections, RouteScope::PROJECT, AuthType::AccessTokenOrApiKey, permission(ModelKind::Collection, READ));
route_rule!(CreateCollection, RouteScope::PROJECT, AuthType::AccessTokenOrApiKey, permission(ModelKind::Collection, CREATE));

// ── Applications ────────────────────────────────────────────

route_rule!(
    /// Typed target: denied application types are recorded, not raised.
    ReadApplications, RouteScope::ACCOUNT, AuthType::AccessToken, permission(ModelKind::Application, READ)
);
route_rule!(ReadConfigurations, RouteScope::ACCOUNT, AuthType::AccessToken, permission(ModelKind::Configuration, READ));
route_rule!(CreateConfiguration, RouteScope::ACCOUNT, AuthType::AccessToken, permission(ModelKind::Configuration, CREATE));
route_rule!(UpdateConfiguration, RouteScope::ACCOUNT, AuthType::AccessToken, permission(ModelKind::Configuration, UPDATE));
route_rule!(ReadInstances, RouteScope::PROJECT, AuthType::AccessTokenOrApiKey, permission(ModelKind::Instance, READ));
route_rule!(CreateInstance, RouteScope::PROJECT, AuthType::AccessTokenOrApiKey, permission(ModelKind::Instance, CREATE));
route_rule!(ReadInstanceConfiguration, RouteScope::PROJECT, AuthType::AccessTokenOrApiKey, permission(ModelKind::Instance, CONFIGURATION_READ));

// ── Post-checks ─────────────────────────────────────────────

fn require(allowed: bool, message: impl FnOnce() -> String) -> AppResult<()> {
    if allowed {
        Ok(())
    } else {
        Err(AppError::authorization(message()))
    }
}

fn param(scope: &ScopeContext, name: &str) -> String {
    scope.get(name).map(|id| id.to_string()).unwrap_or_default()
}

fn is_privileged(info: &ValidationInfo) -> bool {
    info.is_superadmin() || info.is_account_admin()
}

fn manages_project(info: &ValidationInfo) -> bool {
    is_privileged(info) || info.is_project_admin()
}

fn superadmin_creates_accounts(info: &ValidationInfo, _: &ScopeContext) -> AppResult<()> {
    require(info.is_superadmin(), || {
        "you do not have superadmin privileges to create accounts".to_string()
    })
}

fn admin_patches_account(info: &ValidationInfo, scope: &ScopeContext) -> AppResult<()> {
    require(is_privileged(info), || {
        format!(
            "you do not have superadmin/admin privileges to patch account - '{}'",
            param(scope, "account_id")
        )
    })
}

fn admin_manages_account_users(info: &ValidationInfo, scope: &ScopeContext) -> AppResult<()> {
    require(is_privileged(info), || {
        format!(
            "you do not have superadmin/admin privileges to assign or deassign users in account - '{}'",
            param(scope, "account_id")
        )
    })
}

fn admin_updates_account_admin(info: &ValidationInfo, scope: &ScopeContext) -> AppResult<()> {
    require(is_privileged(info), || {
        format!(
            "you do not have superadmin/admin privileges to update user admin status in account - '{}'",
            param(scope, "account_id")
        )
    })
}

fn superadmin_manages_roles(info: &ValidationInfo, _: &ScopeContext) -> AppResult<()> {
    require(info.is_superadmin(), || {
        "you do not have superadmin privileges to manage roles".to_string()
    })
}

fn superadmin_creates_users(info: &ValidationInfo, _: &ScopeContext) -> AppResult<()> {
    require(info.is_superadmin(), || {
        "you do not have superadmin privileges to create users".to_string()
    })
}

fn superadmin_updates_superadmin(info: &ValidationInfo, scope: &ScopeContext) -> AppResult<()> {
    require(info.is_superadmin(), || {
        format!(
            "you do not have superadmin privileges to update superadmin status of user - '{}'",
            param(scope, "user_id")
        )
    })
}

fn admin_updates_user_roles(info: &ValidationInfo, scope: &ScopeContext) -> AppResult<()> {
    require(is_privileged(info), || {
        format!(
            "you do not have superadmin/account-admin privileges to update user-account roles in account - '{}'",
            param(scope, "account_id")
        )
    })
}

fn admin_reads_overrides(info: &ValidationInfo, scope: &ScopeContext) -> AppResult<()> {
    require(manages_project(info), || {
        format!(
            "you do not have superadmin,admin or project association with project-admin privileges to read project permission overrides for user - '{}' - in project - '{}'",
            param(scope, "user_id"),
            param(scope, "project_id")
        )
    })
}

fn admin_updates_overrides(info: &ValidationInfo, scope: &ScopeContext) -> AppResult<()> {
    require(manages_project(info), || {
        format!(
            "you do not have superadmin,admin or project association with project-admin privileges to update project permission overrides for user - '{}' - in project - '{}'",
            param(scope, "user_id"),
            param(scope, "project_id")
        )
    })
}

fn admin_assigns_project_users(info: &ValidationInfo, scope: &ScopeContext) -> AppResult<()> {
    require(manages_project(info), || {
        format!(
            "logged-in user - '{}' - does not have superadmin,account-admin or project-admin privileges to assign users to project - '{}'",
            info.entity.id(),
            param(scope, "project_id")
        )
    })
}

fn self_or_admin_deassigns_project_user(
    info: &ValidationInfo,
    scope: &ScopeContext,
) -> AppResult<()> {
    let is_self = scope.get("user_id") == Some(info.entity.id());
    require(is_self || manages_project(info), || {
        format!(
            "logged-in user - '{}' - does not have superadmin,account-admin or project-admin privileges to deassign user - '{}' - from project - '{}'",
            info.entity.id(),
            param(scope, "user_id"),
            param(scope, "project_id")
        )
    })
}

fn admin_updates_project_admin(info: &ValidationInfo, scope: &ScopeContext) -> AppResult<()> {
    require(manages_project(info), || {
        format!(
            "logged-in user - '{}' - does not have superadmin,account-admin or project-admin privileges to update user project admin status in project - '{}'",
            info.entity.id(),
            param(scope, "project_id")
        )
    })
}

fn admin_creates_dataset(info: &ValidationInfo, scope: &ScopeContext) -> AppResult<()> {
    require(manages_project(info), || {
        format!(
            "you do not have superadmin,account-admin or project-admin privileges to create datasets in project - '{}'",
            param(scope, "project_id")
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::BTreeMap;

    use chrono::Utc;
    use uuid::Uuid;

    use elevaite_auth::AuthenticatedEntity;
    use elevaite_core::ErrorKind;
    use elevaite_entity::association::{UserAccount, UserProject};
    use elevaite_entity::user::User;

    fn user(is_superadmin: bool) -> User {
        User {
            id: Uuid::new_v4(),
            email: "member@acme.test".to_string(),
            firstname: None,
            lastname: None,
            is_superadmin,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn info(user: &User, account_admin: bool, project_admin: bool, project_id: Uuid) -> ValidationInfo {
        let mut info = ValidationInfo::authenticated(AuthenticatedEntity::User(user.clone()));
        info.user_account = Some(UserAccount {
            id: Uuid::new_v4(),
            user_id: user.id,
            account_id: Uuid::new_v4(),
            is_admin: account_admin,
        });
        info.user_project = Some(UserProject {
            id: Uuid::new_v4(),
            user_id: user.id,
            project_id,
            is_admin: project_admin,
            permission_overrides: serde_json::json!({}),
        });
        info
    }

    fn scope(project_id: Uuid, user_id: Uuid) -> ScopeContext {
        ScopeContext::from_params(BTreeMap::from([
            ("project_id".to_string(), project_id),
            ("user_id".to_string(), user_id),
        ]))
    }

    #[test]
    fn test_member_may_leave_project() {
        let project_id = Uuid::new_v4();
        let member = user(false);
        let info = info(&member, false, false, project_id);
        assert!(DeassignProjectUser::post_check(&info, &scope(project_id, member.id)).is_ok());
    }

    #[test]
    fn test_member_may_not_remove_others() {
        let project_id = Uuid::new_v4();
        let member = user(false);
        let other = Uuid::new_v4();
        let info = info(&member, false, false, project_id);

        let err = DeassignProjectUser::post_check(&info, &scope(project_id, other)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);
        assert_eq!(
            err.message,
            format!(
                "logged-in user - '{}' - does not have superadmin,account-admin or project-admin privileges to deassign user - '{other}' - from project - '{project_id}'",
                member.id
            )
        );
    }

    #[test]
    fn test_admins_may_remove_others() {
        let project_id = Uuid::new_v4();
        let other = Uuid::new_v4();

        let project_admin = user(false);
        let info_pa = info(&project_admin, false, true, project_id);
        assert!(DeassignProjectUser::post_check(&info_pa, &scope(project_id, other)).is_ok());

        let account_admin = user(false);
        let info_aa = info(&account_admin, true, false, project_id);
        assert!(DeassignProjectUser::post_check(&info_aa, &scope(project_id, other)).is_ok());

        let superadmin = user(true);
        let info_sa = ValidationInfo::authenticated(AuthenticatedEntity::User(superadmin));
        assert!(DeassignProjectUser::post_check(&info_sa, &scope(project_id, other)).is_ok());
    }

    #[test]
    fn test_superadmin_only_rules() {
        let member = ValidationInfo::authenticated(AuthenticatedEntity::User(user(false)));
        let err = CreateAccount::post_check(&member, &ScopeContext::default()).unwrap_err();
        assert_eq!(err.message, "you do not have superadmin privileges to create accounts");
        assert!(ManageRoles::post_check(&member, &ScopeContext::default()).is_err());

        let superadmin = ValidationInfo::authenticated(AuthenticatedEntity::User(user(true)));
        assert!(CreateAccount::post_check(&superadmin, &ScopeContext::default()).is_ok());
        assert!(CreateUser::post_check(&superadmin, &ScopeContext::default()).is_ok());
    }

    #[test]
    fn test_rules_without_post_check_pass() {
        let member = ValidationInfo::authenticated(AuthenticatedEntity::User(user(false)));
        assert!(ListAccounts::post_check(&member, &ScopeContext::default()).is_ok());
        assert!(TagDataset::post_check(&member, &ScopeContext::default()).is_ok());
    }

    #[test]
    fn test_rule_declarations() {
        assert_eq!(TagDataset::NAME, "TagDataset");
        assert_eq!(TagDataset::SCOPE, RouteScope::PROJECT);
        assert!(matches!(
            ReadInstanceConfiguration::CHECK,
            Check::Permission { target: ModelKind::Instance, actions: ["CONFIGURATION", "READ"] }
        ));
        assert!(matches!(CreateAccount::CHECK, Check::Authentication));
        assert_eq!(CreateApikey::AUTH, AuthType::AccessToken);
    }
}
