//! Project API key handlers. Keys are managed with user access tokens only.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use elevaite_entity::apikey::Apikey;
use elevaite_service::{CreatedApikey, MessageResponse};

use crate::dto::request::CreateApikeyRequest;
use crate::error::ApiResult;
use crate::extractors::ValidJson;
use crate::state::AppState;
use crate::validators::Validated;
use crate::validators::rules;

/// POST /projects/{project_id}/apikeys
pub async fn create_apikey(
    State(state): State<AppState>,
    v: Validated<rules::CreateApikey>,
    ValidJson(req): ValidJson<CreateApikeyRequest>,
) -> ApiResult<(StatusCode, Json<CreatedApikey>)> {
    let created = state
        .services
        .apikeys
        .create_apikey(
            &v.context(),
            v.project()?.id,
            elevaite_service::CreateApikeyRequest {
                name: req.name,
                permissions_type: req.permissions_type,
                permissions: req.permissions,
                expires_at: req.expires_at,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /projects/{project_id}/apikeys
pub async fn list_apikeys(
    State(state): State<AppState>,
    v: Validated<rules::ReadApikeys>,
) -> ApiResult<Json<Vec<Apikey>>> {
    let apikeys = state
        .services
        .apikeys
        .list_apikeys(&v.context(), v.project()?.id)
        .await?;
    Ok(Json(apikeys))
}

/// GET /projects/{project_id}/apikeys/{apikey_id}
pub async fn get_apikey(
    State(state): State<AppState>,
    v: Validated<rules::ReadApikeys>,
) -> ApiResult<Json<Apikey>> {
    let apikey = state
        .services
        .apikeys
        .get_apikey(&v.context(), v.apikey()?)?;
    Ok(Json(apikey))
}

/// DELETE /projects/{project_id}/apikeys/{apikey_id}
pub async fn delete_apikey(
    State(state): State<AppState>,
    v: Validated<rules::ReadApikeys>,
) -> ApiResult<Json<MessageResponse>> {
    let message = state
        .services
        .apikeys
        .delete_apikey(&v.context(), v.apikey()?)
        .await?;
    Ok(Json(message))
}
