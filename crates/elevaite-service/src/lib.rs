//! # elevaite-service
//!
//! Business logic service layer for elevAIte RBAC. Each service
//! orchestrates repositories to implement the use cases behind the HTTP
//! endpoints, after the route's RBAC validation has passed.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time via `Arc` references.

pub mod account;
pub mod apikey;
pub mod context;
pub mod project;
pub mod resource;
pub mod role;
pub mod user;

use std::sync::Arc;

use uuid::Uuid;

use elevaite_database::DatabasePool;
use elevaite_database::repositories::{
    AccountRepository, ApikeyRepository, ApplicationRepository, CollectionRepository,
    ConfigurationRepository, DatasetRepository, InstanceRepository, ProjectRepository,
    RoleAssignmentRepository, RoleRepository, UserAccountRepository, UserProjectRepository,
    UserRepository,
};

pub use account::{AccountService, AccountUser, AccountUserFilter};
pub use apikey::{ApikeyService, CreateApikeyRequest, CreatedApikey};
pub use context::{AdminAction, MessageResponse, RequestContext};
pub use project::{CreateProjectRequest, ProjectService};
pub use resource::{
    ApplicationService, CreateConfigurationRequest, CreateInstanceRequest, DatasetService,
};
pub use role::{RoleAssignmentAction, RoleService};
pub use user::{UserProfile, UserService};

/// Every service, wired against one connection pool.
#[derive(Debug, Clone)]
pub struct Services {
    pub accounts: Arc<AccountService>,
    pub projects: Arc<ProjectService>,
    pub roles: Arc<RoleService>,
    pub users: Arc<UserService>,
    pub apikeys: Arc<ApikeyService>,
    pub applications: Arc<ApplicationService>,
    pub datasets: Arc<DatasetService>,
}

impl Services {
    pub fn new(db: &DatabasePool, apikey_max_lifetime_days: i64) -> Self {
        let pool = db.pool();
        let account_repo = Arc::new(AccountRepository::new(pool.clone()));
        let project_repo = Arc::new(ProjectRepository::new(pool.clone()));
        let role_repo = Arc::new(RoleRepository::new(pool.clone()));
        let user_repo = Arc::new(UserRepository::new(pool.clone()));
        let user_account_repo = Arc::new(UserAccountRepository::new(pool.clone()));
        let user_project_repo = Arc::new(UserProjectRepository::new(pool.clone()));

        Self {
            accounts: Arc::new(AccountService::new(
                Arc::clone(&account_repo),
                Arc::clone(&user_repo),
                Arc::clone(&user_account_repo),
                Arc::clone(&role_repo),
            )),
            projects: Arc::new(ProjectService::new(
                project_repo,
                Arc::clone(&user_repo),
                Arc::clone(&user_account_repo),
                Arc::clone(&user_project_repo),
            )),
            roles: Arc::new(RoleService::new(
                Arc::clone(&role_repo),
                Arc::new(RoleAssignmentRepository::new(pool.clone())),
                Arc::clone(&user_repo),
                Arc::clone(&user_account_repo),
            )),
            users: Arc::new(UserService::new(
                user_repo,
                account_repo,
                Arc::clone(&role_repo),
                user_account_repo,
                user_project_repo,
            )),
            apikeys: Arc::new(ApikeyService::new(
                Arc::new(ApikeyRepository::new(pool.clone())),
                role_repo,
                apikey_max_lifetime_days,
            )),
            applications: Arc::new(ApplicationService::new(
                Arc::new(ApplicationRepository::new(pool.clone())),
                Arc::new(ConfigurationRepository::new(pool.clone())),
                Arc::new(InstanceRepository::new(pool.clone())),
            )),
            datasets: Arc::new(DatasetService::new(
                Arc::new(DatasetRepository::new(pool.clone())),
                Arc::new(CollectionRepository::new(pool.clone())),
            )),
        }
    }
}

/// Ids in first-seen order without repeats.
pub(crate) fn dedup_ids(ids: &[Uuid]) -> Vec<Uuid> {
    let mut unique = Vec::with_capacity(ids.len());
    for id in ids {
        if !unique.contains(id) {
            unique.push(*id);
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_ids_keeps_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(dedup_ids(&[b, a, b, a]), vec![b, a]);
        assert!(dedup_ids(&[]).is_empty());
    }
}
