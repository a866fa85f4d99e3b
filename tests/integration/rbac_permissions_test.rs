//! Integration tests for batch permission evaluation.

mod helpers;

use axum::http::{Method, StatusCode};
use serde_json::json;

use helpers::{ACCOUNT_HEADER, PROJECT_HEADER, TestApp, World, bearer, dataset_reader};

const EVALUATE: &str = "/auth/rbac-permissions";

#[tokio::test]
async fn test_evaluation_requires_access_token() {
    let world = World::new();
    let app = TestApp::new(world.data(dataset_reader()));

    let (status, body) = app
        .send(Method::POST, EVALUATE, &[], Some(json!({ "DATASET_READ": {} })))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "AUTHENTICATION");
    assert_eq!(body["message"], "Missing access token");
}

#[tokio::test]
async fn test_empty_payload_is_rejected() {
    let world = World::new();
    let app = TestApp::new(world.data(dataset_reader()));
    let token = app.token(&world.member);

    let (status, body) = app
        .send(
            Method::POST,
            EVALUATE,
            &[
                bearer(&token),
                (ACCOUNT_HEADER, world.account.id.to_string()),
                (PROJECT_HEADER, world.project.id.to_string()),
            ],
            Some(json!({})),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "At least one field must be provided in payload");
}

#[tokio::test]
async fn test_unknown_field_is_rejected() {
    let world = World::new();
    let app = TestApp::new(world.data(dataset_reader()));
    let token = app.token(&world.member);

    let (status, body) = app
        .send(
            Method::POST,
            EVALUATE,
            &[bearer(&token)],
            Some(json!({ "DATASET_DELETE": {} })),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "VALIDATION");
}

#[tokio::test]
async fn test_member_evaluation_reflects_role() {
    let world = World::new();
    let app = TestApp::new(world.data(dataset_reader()));
    let token = app.token(&world.member);

    let (status, body) = app
        .send(
            Method::POST,
            EVALUATE,
            &[
                bearer(&token),
                (ACCOUNT_HEADER, world.account.id.to_string()),
                (PROJECT_HEADER, world.project.id.to_string()),
            ],
            Some(json!({
                "IS_PROJECT_ADMIN": {},
                "PROJECT_READ": {},
                "DATASET_READ": {},
                "DATASET_TAG": {}
            })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["IS_PROJECT_ADMIN"], json!({ "OVERALL_PERMISSIONS": false }));
    assert_eq!(body["PROJECT_READ"], json!({ "OVERALL_PERMISSIONS": true }));
    assert_eq!(body["DATASET_READ"], json!({ "OVERALL_PERMISSIONS": true }));
    assert_eq!(body["DATASET_TAG"], json!({ "OVERALL_PERMISSIONS": false }));
    assert_eq!(body["COLLECTION_READ"], "NOT_EVALUATED");
    assert_eq!(app.store.stats().commits(), 1);
}

#[tokio::test]
async fn test_superadmin_is_allowed_everything() {
    let world = World::new();
    let app = TestApp::new(world.data(json!({})));
    let token = app.token(&world.superadmin);

    let (status, body) = app
        .send(
            Method::POST,
            EVALUATE,
            &[bearer(&token)],
            Some(json!({ "DATASET_TAG": {}, "APPLICATION_READ": {} })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["DATASET_TAG"]["OVERALL_PERMISSIONS"], true);
    assert_eq!(
        body["APPLICATION_READ"]["SPECIFIC_PERMISSIONS"]["applicationType"],
        json!({ "ingest": true, "preprocess": true })
    );
}

#[tokio::test]
async fn test_project_field_needs_project_header() {
    let world = World::new();
    let app = TestApp::new(world.data(dataset_reader()));
    let token = app.token(&world.member);

    let (status, body) = app
        .send(
            Method::POST,
            EVALUATE,
            &[bearer(&token), (ACCOUNT_HEADER, world.account.id.to_string())],
            Some(json!({ "DATASET_TAG": {} })),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["message"],
        "X-elevAIte-ProjectId is required to evaluate DATASET_TAG permissions for user"
    );
    assert_eq!(app.store.stats().rollbacks(), 1);
}

#[tokio::test]
async fn test_store_failure_is_service_unavailable() {
    let world = World::new();
    let app = TestApp::new(world.data(dataset_reader()));
    let token = app.token(&world.member);
    app.store.fail_reads(true);

    let (status, body) = app
        .send(
            Method::POST,
            EVALUATE,
            &[
                bearer(&token),
                (ACCOUNT_HEADER, world.account.id.to_string()),
                (PROJECT_HEADER, world.project.id.to_string()),
            ],
            Some(json!({ "DATASET_READ": {} })),
        )
        .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "SERVICE_UNAVAILABLE");
    assert_eq!(app.store.stats().rollbacks(), 1);
    assert_eq!(app.store.stats().commits(), 0);
}
