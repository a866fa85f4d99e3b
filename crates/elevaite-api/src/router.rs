//! Route definitions for the elevAIte RBAC HTTP API.
//!
//! Routes are organized by domain. Every protected handler takes a
//! `Validated<Rule>` argument, so authorization happens in the extractor
//! before the handler body runs.

use std::time::Duration;

use axum::{
    Router,
    http::StatusCode,
    middleware as axum_middleware,
    routing::{delete, get, patch, post},
};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = middleware::cors::build_cors_layer(&state.config.server.cors, &state.config.rbac);
    let timeout = Duration::from_secs(state.config.server.request_timeout_seconds);

    Router::new()
        .merge(auth_routes())
        .merge(account_routes())
        .merge(role_routes())
        .merge(user_routes())
        .merge(project_routes())
        .merge(application_routes())
        .merge(health_routes())
        .layer(middleware::compression::build_compression_layer())
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn(
            middleware::logging::request_logging,
        ))
        .with_state(state)
}

/// Permission evaluation
fn auth_routes() -> Router<AppState> {
    Router::new().route(
        "/auth/rbac-permissions",
        post(handlers::auth::evaluate_rbac_permissions),
    )
}

/// Accounts and their members
fn account_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/accounts",
            post(handlers::account::create_account).get(handlers::account::list_accounts),
        )
        .route(
            "/accounts/{account_id}",
            get(handlers::account::get_account).patch(handlers::account::patch_account),
        )
        .route(
            "/accounts/{account_id}/users",
            get(handlers::account::list_account_users)
                .post(handlers::account::assign_account_users),
        )
        .route(
            "/accounts/{account_id}/users/{user_id}",
            delete(handlers::account::deassign_account_user),
        )
        .route(
            "/accounts/{account_id}/users/{user_id}/admin",
            patch(handlers::account::update_account_admin),
        )
}

/// Role definitions
fn role_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/roles",
            post(handlers::role::create_role).get(handlers::role::list_roles),
        )
        .route(
            "/roles/{role_id}",
            get(handlers::role::get_role)
                .patch(handlers::role::patch_role)
                .delete(handlers::role::delete_role),
        )
}

/// Users, their superadmin flag, roles and overrides
fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(handlers::user::create_user))
        .route("/users/{user_id}/profile", get(handlers::user::get_profile))
        .route(
            "/users/{user_id}/superadmin",
            patch(handlers::user::update_superadmin),
        )
        .route(
            "/users/{user_id}/accounts/{account_id}/roles",
            patch(handlers::user::patch_account_roles),
        )
        .route(
            "/users/{user_id}/projects/{project_id}/permission-overrides",
            get(handlers::user::get_permission_overrides)
                .put(handlers::user::update_permission_overrides),
        )
}

/// Projects and the resources bound to them
fn project_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/projects",
            post(handlers::project::create_project).get(handlers::project::list_projects),
        )
        .route("/projects/{project_id}", get(handlers::project::get_project))
        .route(
            "/projects/{project_id}/users",
            get(handlers::project::list_project_users)
                .post(handlers::project::assign_project_users),
        )
        .route(
            "/projects/{project_id}/users/{user_id}",
            delete(handlers::project::deassign_project_user),
        )
        .route(
            "/projects/{project_id}/users/{user_id}/admin",
            patch(handlers::project::update_project_admin),
        )
        // API keys
        .route(
            "/projects/{project_id}/apikeys",
            post(handlers::apikey::create_apikey).get(handlers::apikey::list_apikeys),
        )
        .route(
            "/projects/{project_id}/apikeys/{apikey_id}",
            get(handlers::apikey::get_apikey).delete(handlers::apikey::delete_apikey),
        )
        // Datasets and collections
        .route(
            "/projects/{project_id}/datasets",
            get(handlers::dataset::list_datasets).post(handlers::dataset::create_dataset),
        )
        .route(
            "/projects/{project_id}/datasets/{dataset_id}",
            get(handlers::dataset::get_dataset),
        )
        .route(
            "/projects/{project_id}/datasets/{dataset_id}/tags",
            post(handlers::dataset::tag_dataset),
        )
        .route(
            "/projects/{project_id}/collections",
            get(handlers::dataset::list_collections)
                .post(handlers::dataset::create_collection),
        )
}

/// Applications, configurations and instances
fn application_routes() -> Router<AppState> {
    Router::new()
        .route("/application", get(handlers::application::list_applications))
        .route(
            "/application/{application_id}",
            get(handlers::application::get_application),
        )
        .route(
            "/application/{application_id}/configuration",
            get(handlers::application::list_configurations)
                .post(handlers::application::create_configuration),
        )
        .route(
            "/application/{application_id}/configuration/{configuration_id}",
            get(handlers::application::get_configuration)
                .put(handlers::application::update_configuration),
        )
        .route(
            "/application/{application_id}/instance",
            get(handlers::application::list_instances)
                .post(handlers::application::create_instance),
        )
        .route(
            "/application/{application_id}/instance/{instance_id}/configuration",
            get(handlers::application::get_instance_configuration),
        )
}

/// Liveness and database connectivity
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
