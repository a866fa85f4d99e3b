//! Role handlers. Reads are open to any user; writes need superadmin.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use elevaite_entity::role::{CreateRole, Role, UpdateRole};
use elevaite_service::MessageResponse;

use crate::dto::request::{CreateRoleRequest, PatchRoleRequest};
use crate::error::ApiResult;
use crate::extractors::ValidJson;
use crate::state::AppState;
use crate::validators::Validated;
use crate::validators::rules;

/// POST /roles
pub async fn create_role(
    State(state): State<AppState>,
    _v: Validated<rules::ManageRoles>,
    ValidJson(req): ValidJson<CreateRoleRequest>,
) -> ApiResult<(StatusCode, Json<Role>)> {
    let role = state
        .services
        .roles
        .create_role(CreateRole {
            name: req.name,
            permissions: req.permissions,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(role)))
}

/// GET /roles
pub async fn list_roles(
    State(state): State<AppState>,
    _v: Validated<rules::ReadRoles>,
) -> ApiResult<Json<Vec<Role>>> {
    Ok(Json(state.services.roles.list_roles().await?))
}

/// GET /roles/{role_id}
pub async fn get_role(
    State(state): State<AppState>,
    v: Validated<rules::ReadRoles>,
) -> ApiResult<Json<Role>> {
    Ok(Json(state.services.roles.get_role(v.id("role_id")?).await?))
}

/// PATCH /roles/{role_id}
pub async fn patch_role(
    State(state): State<AppState>,
    v: Validated<rules::ManageRoles>,
    ValidJson(req): ValidJson<PatchRoleRequest>,
) -> ApiResult<Json<Role>> {
    let role = state
        .services
        .roles
        .update_role(
            v.id("role_id")?,
            UpdateRole {
                name: req.name,
                permissions: req.permissions,
            },
        )
        .await?;
    Ok(Json(role))
}

/// DELETE /roles/{role_id}
pub async fn delete_role(
    State(state): State<AppState>,
    v: Validated<rules::ManageRoles>,
) -> ApiResult<Json<MessageResponse>> {
    Ok(Json(state.services.roles.delete_role(v.id("role_id")?).await?))
}
