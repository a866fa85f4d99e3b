//! User handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde_json::Value;

use elevaite_entity::user::{CreateUser, User};
use elevaite_service::{MessageResponse, UserProfile};

use crate::dto::request::{AdminActionRequest, CreateUserRequest, RoleAssignmentRequest};
use crate::error::ApiResult;
use crate::extractors::{JsonBody, ValidJson};
use crate::state::AppState;
use crate::validators::Validated;
use crate::validators::rules;

/// POST /users
pub async fn create_user(
    State(state): State<AppState>,
    _v: Validated<rules::CreateUser>,
    ValidJson(req): ValidJson<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = state
        .services
        .users
        .create_user(CreateUser {
            email: req.email,
            firstname: req.firstname,
            lastname: req.lastname,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /users/{user_id}/profile
pub async fn get_profile(
    State(state): State<AppState>,
    v: Validated<rules::ReadUserProfile>,
) -> ApiResult<Json<UserProfile>> {
    let account_id = v.info.account().map(|a| a.id);
    let profile = state
        .services
        .users
        .get_profile(&v.context(), v.user()?.id, account_id)
        .await?;
    Ok(Json(profile))
}

/// PATCH /users/{user_id}/superadmin
pub async fn update_superadmin(
    State(state): State<AppState>,
    v: Validated<rules::UpdateSuperadmin>,
    JsonBody(req): JsonBody<AdminActionRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let message = state
        .services
        .users
        .set_superadmin(&v.context(), v.user()?.id, req.action)
        .await?;
    Ok(Json(message))
}

/// PATCH /users/{user_id}/accounts/{account_id}/roles
pub async fn patch_account_roles(
    State(state): State<AppState>,
    v: Validated<rules::PatchUserAccountRoles>,
    ValidJson(req): ValidJson<RoleAssignmentRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let message = state
        .services
        .roles
        .patch_user_account_roles(v.user()?.id, v.account()?.id, req.action, &req.role_ids)
        .await?;
    Ok(Json(message))
}

/// GET /users/{user_id}/projects/{project_id}/permission-overrides
pub async fn get_permission_overrides(
    State(state): State<AppState>,
    v: Validated<rules::ReadPermissionOverrides>,
) -> ApiResult<Json<Value>> {
    let overrides = state
        .services
        .users
        .get_permission_overrides(v.user()?.id, v.account()?.id, v.project()?.id)
        .await?;
    Ok(Json(overrides))
}

/// PUT /users/{user_id}/projects/{project_id}/permission-overrides
pub async fn update_permission_overrides(
    State(state): State<AppState>,
    v: Validated<rules::UpdatePermissionOverrides>,
    JsonBody(overrides): JsonBody<Value>,
) -> ApiResult<Json<MessageResponse>> {
    let message = state
        .services
        .users
        .update_permission_overrides(v.user()?.id, v.account()?.id, v.project()?.id, &overrides)
        .await?;
    Ok(Json(message))
}
