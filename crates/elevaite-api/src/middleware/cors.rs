//! CORS layer configuration.

use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{Any, CorsLayer};

use elevaite_core::config::app::CorsConfig;
use elevaite_core::config::rbac::RbacConfig;

/// Builds a CORS tower layer from configuration.
///
/// The RBAC scope and API key headers are always allowed.
pub fn build_cors_layer(config: &CorsConfig, rbac: &RbacConfig) -> CorsLayer {
    let mut layer = CorsLayer::new().allow_methods([
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ]);

    // Origins
    if config.allowed_origins.iter().any(|o| o == "*") {
        layer = layer.allow_origin(Any);
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        layer = layer.allow_origin(origins);
    }

    // Headers
    let mut headers = vec![header::AUTHORIZATION, header::CONTENT_TYPE];
    headers.extend(
        [&rbac.account_header, &rbac.project_header, &rbac.apikey_header]
            .into_iter()
            .filter_map(|name| HeaderName::try_from(name.as_str()).ok()),
    );

    layer
        .allow_headers(headers)
        .max_age(Duration::from_secs(config.max_age_seconds))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builds_with_explicit_origins() {
        let config = CorsConfig {
            allowed_origins: vec!["https://app.elevaite.test".to_string(), "not a header\n".to_string()],
            max_age_seconds: 60,
        };
        let _layer = build_cors_layer(&config, &RbacConfig::default());
    }
}
