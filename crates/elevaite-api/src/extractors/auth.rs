//! Authentication of a request: Bearer access token or API key header.

use axum::http::HeaderMap;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::{Authorization, HeaderMapExt};
use tracing::debug;

use elevaite_auth::{ApikeySecret, AuthenticatedEntity};
use elevaite_core::{AppError, AppResult};
use elevaite_database::rbac::RbacStore;
use elevaite_entity::{ModelKind, Resource};

use crate::state::AppState;

/// Credentials an endpoint accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthType {
    AccessToken,
    ApiKey,
    AccessTokenOrApiKey,
}

impl AuthType {
    fn accepts_token(self) -> bool {
        matches!(self, Self::AccessToken | Self::AccessTokenOrApiKey)
    }

    fn accepts_apikey(self) -> bool {
        matches!(self, Self::ApiKey | Self::AccessTokenOrApiKey)
    }
}

/// Resolve the principal of a request within an open RBAC session.
///
/// When both credentials are accepted and present, the access token wins.
pub async fn authenticate(
    headers: &HeaderMap,
    state: &AppState,
    store: &dyn RbacStore,
    auth_type: AuthType,
) -> AppResult<AuthenticatedEntity> {
    let bearer = headers
        .typed_get::<Authorization<Bearer>>()
        .map(|Authorization(bearer)| bearer.token().to_string());
    let apikey = headers
        .get(state.config.rbac.apikey_header.as_str())
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    match (bearer, apikey) {
        (Some(token), _) if auth_type.accepts_token() => {
            authenticate_token(&token, state, store).await
        }
        (_, Some(key)) if auth_type.accepts_apikey() => authenticate_apikey(&key, store).await,
        _ => Err(AppError::authentication(match auth_type {
            AuthType::AccessToken => "Missing access token",
            AuthType::ApiKey => "Missing apikey",
            AuthType::AccessTokenOrApiKey => "Missing access token or apikey",
        })),
    }
}

async fn authenticate_token(
    token: &str,
    state: &AppState,
    store: &dyn RbacStore,
) -> AppResult<AuthenticatedEntity> {
    let claims = state.jwt_decoder.decode_access_token(token)?;
    match store.find_resource(ModelKind::User, claims.user_id()).await? {
        Some(Resource::User(user)) => {
            debug!(user_id = %user.id, "Authenticated by access token");
            Ok(AuthenticatedEntity::User(user))
        }
        _ => Err(AppError::authentication("user is unauthenticated")),
    }
}

async fn authenticate_apikey(raw: &str, store: &dyn RbacStore) -> AppResult<AuthenticatedEntity> {
    let secret = ApikeySecret::parse(raw)?;
    let apikey = match store.find_resource(ModelKind::Apikey, secret.id).await? {
        Some(Resource::Apikey(apikey)) => apikey,
        _ => return Err(AppError::authentication("Invalid API key")),
    };
    if !secret.verify(&apikey.key_hash)? {
        return Err(AppError::authentication("Invalid API key"));
    }
    if apikey.is_expired() {
        return Err(AppError::authentication(format!(
            "apikey - '{}' - has expired",
            apikey.id
        )));
    }
    debug!(apikey_id = %apikey.id, project_id = %apikey.project_id, "Authenticated by API key");
    Ok(AuthenticatedEntity::Apikey(apikey))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_type_acceptance() {
        assert!(AuthType::AccessToken.accepts_token());
        assert!(!AuthType::AccessToken.accepts_apikey());
        assert!(AuthType::ApiKey.accepts_apikey());
        assert!(!AuthType::ApiKey.accepts_token());
        assert!(AuthType::AccessTokenOrApiKey.accepts_token());
        assert!(AuthType::AccessTokenOrApiKey.accepts_apikey());
    }
}
