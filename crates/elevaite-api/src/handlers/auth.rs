//! Permission evaluation handler.

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;

use elevaite_auth::{RouteScope, ScopeContext};
use elevaite_core::{AppError, AppResult};
use elevaite_entity::permission::evaluation::{
    PermissionsEvaluationRequest, PermissionsEvaluationResponse,
};

use crate::error::ApiResult;
use crate::extractors::JsonBody;
use crate::extractors::auth::{AuthType, authenticate};
use crate::session::RbacSession;
use crate::state::AppState;

/// POST /auth/rbac-permissions
///
/// Evaluates each requested permission for the calling user in the scope
/// named by the account and project headers.
pub async fn evaluate_rbac_permissions(
    State(state): State<AppState>,
    headers: HeaderMap,
    JsonBody(request): JsonBody<PermissionsEvaluationRequest>,
) -> ApiResult<Json<PermissionsEvaluationResponse>> {
    let session = RbacSession::begin(state.rbac_store.as_ref()).await?;
    let result = evaluate(&state, &headers, &request, &session).await;
    Ok(Json(session.finish(result).await?))
}

async fn evaluate(
    state: &AppState,
    headers: &HeaderMap,
    request: &PermissionsEvaluationRequest,
    session: &RbacSession,
) -> AppResult<PermissionsEvaluationResponse> {
    let store = session.store();
    let entity = authenticate(headers, state, store, AuthType::AccessToken).await?;
    let user = entity
        .as_user()
        .ok_or_else(|| AppError::authentication("user is unauthenticated"))?;

    let rbac = &state.config.rbac;
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    let scope = ScopeContext::resolve(
        RouteScope::ACCOUNT_AND_PROJECT,
        std::iter::empty(),
        header(&rbac.account_header),
        header(&rbac.project_header),
    )?;

    state
        .validator
        .evaluate_rbac_permissions(store, user, scope.account_id(), scope.project_id(), request)
        .await
}
