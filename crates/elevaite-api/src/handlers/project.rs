//! Project handlers.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;

use elevaite_entity::project::Project;
use elevaite_entity::user::User;
use elevaite_service::MessageResponse;

use crate::dto::request::{AdminActionRequest, CreateProjectRequest, ProjectListQuery, UserIdsRequest};
use crate::error::ApiResult;
use crate::extractors::{JsonBody, ValidJson};
use crate::state::AppState;
use crate::validators::Validated;
use crate::validators::rules;

/// POST /projects
///
/// The project header, when present, names the parent project.
pub async fn create_project(
    State(state): State<AppState>,
    v: Validated<rules::CreateProject>,
    ValidJson(req): ValidJson<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    let project = state
        .services
        .projects
        .create_project(
            &v.context(),
            v.account()?.id,
            v.info.project(),
            elevaite_service::CreateProjectRequest {
                name: req.name,
                description: req.description,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(project)))
}

/// GET /projects
pub async fn list_projects(
    State(state): State<AppState>,
    v: Validated<rules::ListProjects>,
    Query(query): Query<ProjectListQuery>,
) -> ApiResult<Json<Vec<Project>>> {
    let parent = v.info.project().map(|p| p.id);
    let projects = state
        .services
        .projects
        .list_projects(&v.context(), v.account()?.id, parent, query.name.as_deref())
        .await?;
    Ok(Json(projects))
}

/// GET /projects/{project_id}
pub async fn get_project(v: Validated<rules::ReadProject>) -> ApiResult<Json<Project>> {
    Ok(Json(v.project()?.clone()))
}

/// GET /projects/{project_id}/users
pub async fn list_project_users(
    State(state): State<AppState>,
    v: Validated<rules::ReadProject>,
) -> ApiResult<Json<Vec<User>>> {
    let users = state
        .services
        .projects
        .list_project_users(v.project()?.id)
        .await?;
    Ok(Json(users))
}

/// POST /projects/{project_id}/users
pub async fn assign_project_users(
    State(state): State<AppState>,
    v: Validated<rules::AssignProjectUsers>,
    ValidJson(req): ValidJson<UserIdsRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let message = state
        .services
        .projects
        .assign_users(v.project()?, &req.user_ids)
        .await?;
    Ok(Json(message))
}

/// DELETE /projects/{project_id}/users/{user_id}
pub async fn deassign_project_user(
    State(state): State<AppState>,
    v: Validated<rules::DeassignProjectUser>,
) -> ApiResult<Json<MessageResponse>> {
    let message = state
        .services
        .projects
        .deassign_user(v.project()?, v.user()?.id)
        .await?;
    Ok(Json(message))
}

/// PATCH /projects/{project_id}/users/{user_id}/admin
pub async fn update_project_admin(
    State(state): State<AppState>,
    v: Validated<rules::UpdateProjectAdmin>,
    JsonBody(req): JsonBody<AdminActionRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let message = state
        .services
        .projects
        .set_project_admin(v.project()?, v.user()?.id, req.action)
        .await?;
    Ok(Json(message))
}
