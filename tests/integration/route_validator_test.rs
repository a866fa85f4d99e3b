//! Integration tests for route validation: authentication, scope
//! resolution and RBAC checks running ahead of handlers.

mod helpers;

use axum::http::{Method, StatusCode};
use serde_json::json;
use uuid::Uuid;

use helpers::{APIKEY_HEADER, TestApp, World, bearer, dataset_reader};

fn dataset_uri(world: &World) -> String {
    format!(
        "/projects/{}/datasets/{}",
        world.project.id, world.dataset.id
    )
}

#[tokio::test]
async fn test_missing_credentials_are_unauthorized() {
    let world = World::new();
    let app = TestApp::new(world.data(dataset_reader()));

    let (status, body) = app.send(Method::GET, &dataset_uri(&world), &[], None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Missing access token or apikey");

    let uri = format!("/projects/{}", world.project.id);
    let (status, body) = app.send(Method::GET, &uri, &[], None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Missing access token");
}

#[tokio::test]
async fn test_garbage_token_is_unauthorized() {
    let world = World::new();
    let app = TestApp::new(world.data(dataset_reader()));

    let (status, body) = app
        .send(
            Method::GET,
            &dataset_uri(&world),
            &[bearer("not-a-jwt")],
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "AUTHENTICATION");
}

#[tokio::test]
async fn test_member_reads_dataset_through_role() {
    let world = World::new();
    let app = TestApp::new(world.data(dataset_reader()));
    let token = app.token(&world.member);

    let (status, body) = app
        .send(Method::GET, &dataset_uri(&world), &[bearer(&token)], None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], world.dataset.id.to_string());
    assert_eq!(body["name"], "tickets");
    assert_eq!(app.store.stats().commits(), 1);
    assert_eq!(app.store.stats().rollbacks(), 0);
}

#[tokio::test]
async fn test_member_without_role_permission_is_forbidden() {
    let world = World::new();
    let app = TestApp::new(world.data(json!({})));
    let token = app.token(&world.member);

    let (status, body) = app
        .send(Method::GET, &dataset_uri(&world), &[bearer(&token)], None)
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "AUTHORIZATION");
    assert_eq!(app.store.stats().rollbacks(), 1);
}

#[tokio::test]
async fn test_tagging_is_checked_before_body() {
    let world = World::new();
    let app = TestApp::new(world.data(dataset_reader()));
    let token = app.token(&world.member);
    let uri = format!("{}/tags", dataset_uri(&world));

    let (status, body) = app
        .send(
            Method::POST,
            &uri,
            &[bearer(&token)],
            Some(json!({ "tags": ["urgent"] })),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["message"],
        format!(
            "you do not have superadmin/account-admin privileges and you do not have account-specific role-based access permissions to perform the action sequence - 'TAG' - on 'Dataset' resources in account - {}",
            world.account.id
        )
    );
}

#[tokio::test]
async fn test_superadmin_bypasses_role_checks() {
    let world = World::new();
    let app = TestApp::new(world.data(json!({})));
    let token = app.token(&world.superadmin);

    let (status, body) = app
        .send(Method::GET, &dataset_uri(&world), &[bearer(&token)], None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], world.dataset.id.to_string());

    let uri = format!("/projects/{}", world.project.id);
    let (status, body) = app.send(Method::GET, &uri, &[bearer(&token)], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "support");
}

#[tokio::test]
async fn test_apikey_reads_dataset_in_its_project() {
    let world = World::new();
    let (apikey, plaintext) = world.apikey(json!({
        "ENTITY_Project": { "ENTITY_Dataset": { "ACTION_READ": "Allow" } }
    }));
    let mut data = world.data(json!({}));
    data.insert(elevaite_entity::Resource::Apikey(apikey));
    let app = TestApp::new(data);

    let (status, _) = app
        .send(
            Method::GET,
            &dataset_uri(&world),
            &[(APIKEY_HEADER, plaintext.clone())],
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // project routes only take access tokens
    let uri = format!("/projects/{}", world.project.id);
    let (status, body) = app
        .send(Method::GET, &uri, &[(APIKEY_HEADER, plaintext)], None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Missing access token");
}

#[tokio::test]
async fn test_tampered_apikey_is_rejected() {
    let world = World::new();
    let (apikey, plaintext) = world.apikey(json!({}));
    let mut data = world.data(json!({}));
    data.insert(elevaite_entity::Resource::Apikey(apikey));
    let app = TestApp::new(data);

    let tampered = format!("{plaintext}x");
    let (status, body) = app
        .send(
            Method::GET,
            &dataset_uri(&world),
            &[(APIKEY_HEADER, tampered)],
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid API key");
}

#[tokio::test]
async fn test_store_failure_rolls_back_once() {
    let world = World::new();
    let app = TestApp::new(world.data(dataset_reader()));
    let token = app.token(&world.member);
    app.store.fail_reads(true);

    let (status, body) = app
        .send(Method::GET, &dataset_uri(&world), &[bearer(&token)], None)
        .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "SERVICE_UNAVAILABLE");
    assert_eq!(app.store.stats().rollbacks(), 1);
    assert_eq!(app.store.stats().commits(), 0);
}

#[tokio::test]
async fn test_member_may_not_remove_peer_from_project() {
    let world = World::new();
    let app = TestApp::new(world.data(dataset_reader()));
    let token = app.token(&world.member);
    let uri = format!("/projects/{}/users/{}", world.project.id, world.peer.id);

    let (status, body) = app
        .send(Method::DELETE, &uri, &[bearer(&token)], None)
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["message"],
        format!(
            "logged-in user - '{}' - does not have superadmin,account-admin or project-admin privileges to deassign user - '{}' - from project - '{}'",
            world.member.id, world.peer.id, world.project.id
        )
    );
}

#[tokio::test]
async fn test_malformed_path_id_is_unprocessable() {
    let world = World::new();
    let app = TestApp::new(world.data(dataset_reader()));
    let token = app.token(&world.member);
    let uri = format!("/projects/{}/datasets/not-a-uuid", world.project.id);

    let (status, body) = app.send(Method::GET, &uri, &[bearer(&token)], None).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "dataset_id - 'not-a-uuid' - is not a valid UUID");
}

#[tokio::test]
async fn test_unknown_dataset_is_not_found() {
    let world = World::new();
    let app = TestApp::new(world.data(dataset_reader()));
    let token = app.token(&world.member);
    let uri = format!("/projects/{}/datasets/{}", world.project.id, Uuid::new_v4());

    let (status, body) = app.send(Method::GET, &uri, &[bearer(&token)], None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");
}

fn apikey_reader() -> serde_json::Value {
    json!({
        "ENTITY_Project": {
            "ACTION_READ": "Allow",
            "ENTITY_Apikey": { "ACTION_READ": "Allow" }
        }
    })
}

#[tokio::test]
async fn test_member_reads_own_apikey() {
    let world = World::new();
    let (apikey, _) = world.apikey(json!({}));
    let uri = format!("/projects/{}/apikeys/{}", world.project.id, apikey.id);
    let mut data = world.data(apikey_reader());
    data.insert(elevaite_entity::Resource::Apikey(apikey.clone()));
    let app = TestApp::new(data);
    let token = app.token(&world.member);

    let (status, body) = app.send(Method::GET, &uri, &[bearer(&token)], None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], apikey.id.to_string());
    assert!(body.get("key_hash").is_none());
}

#[tokio::test]
async fn test_member_may_not_read_peer_apikey() {
    let world = World::new();
    let (mut apikey, _) = world.apikey(json!({}));
    apikey.creator_id = world.peer.id;
    let uri = format!("/projects/{}/apikeys/{}", world.project.id, apikey.id);
    let mut data = world.data(apikey_reader());
    data.insert(elevaite_entity::Resource::Apikey(apikey.clone()));
    let app = TestApp::new(data);
    let token = app.token(&world.member);

    let (status, body) = app.send(Method::GET, &uri, &[bearer(&token)], None).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["message"],
        format!(
            "you do not have permissions to read apikey - '{}' - created by another user",
            apikey.id
        )
    );
}
