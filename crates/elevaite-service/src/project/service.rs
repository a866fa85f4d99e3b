//! Projects, the project hierarchy and project membership.

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use elevaite_core::error::AppError;
use elevaite_database::repositories::{
    ProjectRepository, UserAccountRepository, UserProjectRepository, UserRepository,
};
use elevaite_entity::project::{CreateProject, Project};
use elevaite_entity::user::User;

use crate::context::{AdminAction, MessageResponse, RequestContext};
use crate::dedup_ids;

/// Handles project creation, listing and membership.
#[derive(Debug, Clone)]
pub struct ProjectService {
    projects: Arc<ProjectRepository>,
    users: Arc<UserRepository>,
    user_accounts: Arc<UserAccountRepository>,
    user_projects: Arc<UserProjectRepository>,
}

/// Body of a project creation request.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    pub description: Option<String>,
}

impl ProjectService {
    pub fn new(
        projects: Arc<ProjectRepository>,
        users: Arc<UserRepository>,
        user_accounts: Arc<UserAccountRepository>,
        user_projects: Arc<UserProjectRepository>,
    ) -> Self {
        Self {
            projects,
            users,
            user_accounts,
            user_projects,
        }
    }

    /// Creates a project in `account_id`, nested under `parent` when given.
    ///
    /// The creator becomes the project's first admin.
    pub async fn create_project(
        &self,
        ctx: &RequestContext,
        account_id: Uuid,
        parent: Option<&Project>,
        req: CreateProjectRequest,
    ) -> Result<Project, AppError> {
        let creator = ctx.require_user()?;
        if let Some(parent) = parent {
            if parent.account_id != account_id {
                return Err(AppError::validation(format!(
                    "Project - '{}' - is not associated to account_id - '{account_id}'",
                    parent.id
                )));
            }
        }

        let project = self
            .projects
            .create_with_admin(&CreateProject {
                account_id,
                creator_id: creator.id,
                parent_project_id: parent.map(|p| p.id),
                name: req.name,
                description: req.description,
            })
            .await?;

        info!(
            project_id = %project.id,
            account_id = %account_id,
            parent_project_id = ?project.parent_project_id,
            "Project created"
        );
        Ok(project)
    }

    /// Projects directly under `parent` (or the account root) visible to
    /// the actor, optionally filtered by name.
    ///
    /// Superadmins and account admins see every project; others see only
    /// projects they belong to.
    pub async fn list_projects(
        &self,
        ctx: &RequestContext,
        account_id: Uuid,
        parent: Option<Uuid>,
        name: Option<&str>,
    ) -> Result<Vec<Project>, AppError> {
        let projects = if ctx.is_privileged() {
            self.projects.find_by_account(account_id, parent).await?
        } else {
            self.projects
                .find_by_member(ctx.actor_id(), account_id, parent)
                .await?
        };
        Ok(match name {
            Some(name) => {
                let needle = name.to_lowercase();
                projects
                    .into_iter()
                    .filter(|p| p.name.to_lowercase().contains(&needle))
                    .collect()
            }
            None => projects,
        })
    }

    pub async fn list_project_users(&self, project_id: Uuid) -> Result<Vec<User>, AppError> {
        self.users.find_by_project(project_id).await
    }

    /// Adds users to a project.
    ///
    /// Every user must belong to the project's account and, for a
    /// sub-project, to its parent project.
    pub async fn assign_users(
        &self,
        project: &Project,
        user_ids: &[Uuid],
    ) -> Result<MessageResponse, AppError> {
        let user_ids = dedup_ids(user_ids);
        let expected = user_ids.len() as i64;

        if self.users.find_by_ids(&user_ids).await?.len() != user_ids.len() {
            return Err(AppError::not_found("One or more users not found"));
        }
        if self
            .user_accounts
            .count_members(project.account_id, &user_ids)
            .await?
            != expected
        {
            return Err(AppError::validation(format!(
                "One or more users are not assigned to account - '{}'",
                project.account_id
            )));
        }
        if let Some(parent_id) = project.parent_project_id {
            if self.user_projects.count_members(parent_id, &user_ids).await? != expected {
                return Err(AppError::validation(format!(
                    "One or more users are not assigned to parent project - '{parent_id}'"
                )));
            }
        }
        if self
            .user_projects
            .count_members(project.id, &user_ids)
            .await?
            > 0
        {
            return Err(AppError::conflict(format!(
                "One or more users are already assigned to project - '{}'",
                project.id
            )));
        }

        self.user_projects.create_many(project.id, &user_ids).await?;
        info!(project_id = %project.id, count = user_ids.len(), "Users assigned to project");
        Ok(MessageResponse::new(format!(
            "Successfully assigned {} user/(s) to project - '{}'",
            user_ids.len(),
            project.id
        )))
    }

    /// Removes a user from a project and every project nested under it.
    pub async fn deassign_user(
        &self,
        project: &Project,
        user_id: Uuid,
    ) -> Result<MessageResponse, AppError> {
        self.require_project_member(project, user_id).await?;
        self.user_projects
            .delete_with_descendants(user_id, project.id)
            .await?;

        info!(project_id = %project.id, user_id = %user_id, "User deassigned from project");
        Ok(MessageResponse::new(format!(
            "Successfully deassigned user - '{user_id}' - from project - '{}'",
            project.id
        )))
    }

    /// Grants or revokes project admin status.
    pub async fn set_project_admin(
        &self,
        project: &Project,
        user_id: Uuid,
        action: AdminAction,
    ) -> Result<MessageResponse, AppError> {
        self.require_project_member(project, user_id).await?;
        self.user_projects
            .set_admin(user_id, project.id, action.is_grant())
            .await?;

        info!(
            project_id = %project.id,
            user_id = %user_id,
            action = ?action,
            "Project admin status changed"
        );
        Ok(MessageResponse::new(format!(
            "project-admin status successfully {}",
            action.past_tense()
        )))
    }

    async fn require_project_member(&self, project: &Project, user_id: Uuid) -> Result<(), AppError> {
        if self.users.find_by_id(user_id).await?.is_none() {
            return Err(AppError::not_found(format!("User - '{user_id}' - not found")));
        }
        if self
            .user_accounts
            .find(user_id, project.account_id)
            .await?
            .is_none()
        {
            return Err(AppError::validation(format!(
                "User - '{user_id}' - is not assigned to account - '{}'",
                project.account_id
            )));
        }
        if self.user_projects.find(user_id, project.id).await?.is_none() {
            return Err(AppError::validation(format!(
                "User - '{user_id}' - is not assigned to project - '{}'",
                project.id
            )));
        }
        Ok(())
    }
}
