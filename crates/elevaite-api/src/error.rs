//! Maps domain `AppError` to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use elevaite_core::error::{AppError, ErrorKind, SERVICE_UNAVAILABLE_MESSAGE};

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
}

/// Status code for a client-facing error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Authentication => StatusCode::UNAUTHORIZED,
        ErrorKind::Authorization => StatusCode::FORBIDDEN,
        ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        _ => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Anything that is not client-facing leaves the server as a generic 503.
pub fn into_api_error(err: &AppError) -> (StatusCode, ApiErrorResponse) {
    if err.kind.is_client_facing() {
        return (
            status_for(err.kind),
            ApiErrorResponse {
                error: err.kind.to_string(),
                message: err.message.clone(),
            },
        );
    }

    tracing::error!(kind = %err.kind, error = %err.message, source = ?err.source, "Request failed on server state");
    (
        StatusCode::SERVICE_UNAVAILABLE,
        ApiErrorResponse {
            error: ErrorKind::ServiceUnavailable.to_string(),
            message: SERVICE_UNAVAILABLE_MESSAGE.to_string(),
        },
    )
}

/// Wrapper so foreign errors can be returned from handlers.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = into_api_error(&self.0);
        (status, body).into_response()
    }
}

/// Result type of every handler.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_facing_errors_keep_message() {
        let (status, body) = into_api_error(&AppError::authorization("no access"));
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body.error, "AUTHORIZATION");
        assert_eq!(body.message, "no access");

        let (status, _) = into_api_error(&AppError::validation("bad id"));
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_internal_errors_are_hidden() {
        let (status, body) =
            into_api_error(&AppError::database("relation \"users\" does not exist"));
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.error, "SERVICE_UNAVAILABLE");
        assert_eq!(body.message, SERVICE_UNAVAILABLE_MESSAGE);

        let (status, body) = into_api_error(&AppError::service_unavailable());
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.message, SERVICE_UNAVAILABLE_MESSAGE);
    }
}
