use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::{Value, json};
use uuid::Uuid;

use elevaite_core::error::ErrorKind;
use elevaite_database::rbac::RbacStoreProvider;
use elevaite_database::rbac::memory::{InMemoryRbacData, InMemoryRbacStoreProvider};
use elevaite_entity::account::Account;
use elevaite_entity::apikey::{Apikey, ApikeyPermissionsType};
use elevaite_entity::application::{Application, ApplicationType};
use elevaite_entity::association::{UserAccount, UserProject};
use elevaite_entity::dataset::Dataset;
use elevaite_entity::permission::evaluation::PermissionsEvaluationRequest;
use elevaite_entity::project::Project;
use elevaite_entity::role::Role;
use elevaite_entity::user::User;
use elevaite_entity::{ModelKind, Resource};

use super::*;
use crate::identity::AuthenticatedEntity;

struct Fixture {
    account: Account,
    project: Project,
    child: Project,
    user: User,
    superadmin: User,
    user_account_id: Uuid,
    dataset: Dataset,
    foreign_dataset: Dataset,
    ingest_app: Application,
}

fn user(email: &str, is_superadmin: bool) -> User {
    User {
        id: Uuid::new_v4(),
        email: email.to_string(),
        firstname: None,
        lastname: None,
        is_superadmin,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn project(account_id: Uuid, creator_id: Uuid, parent: Option<Uuid>, name: &str) -> Project {
    Project {
        id: Uuid::new_v4(),
        account_id,
        creator_id,
        parent_project_id: parent,
        name: name.to_string(),
        description: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn dataset(project_id: Uuid) -> Dataset {
    Dataset {
        id: Uuid::new_v4(),
        project_id,
        name: "tickets".to_string(),
        tags: vec![],
        created_at: Utc::now(),
    }
}

fn application(application_type: ApplicationType) -> Application {
    Application {
        id: Uuid::new_v4(),
        title: format!("{} app", application_type.as_str()),
        description: None,
        version: "1.0.0".to_string(),
        application_type,
    }
}

fn fixture() -> Fixture {
    let account = Account {
        id: Uuid::new_v4(),
        name: "Acme".to_string(),
        description: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    let user = user("member@acme.test", false);
    let project = project(account.id, user.id, None, "root");
    let child = project_child(&account, &user, &project);
    let other = self::project(account.id, user.id, None, "other");
    Fixture {
        dataset: dataset(project.id),
        foreign_dataset: dataset(other.id),
        ingest_app: application(ApplicationType::Ingest),
        user_account_id: Uuid::new_v4(),
        superadmin: self::user("root@acme.test", true),
        account,
        project,
        child,
        user,
    }
}

fn project_child(account: &Account, user: &User, parent: &Project) -> Project {
    project(account.id, user.id, Some(parent.id), "child")
}

struct Membership {
    account_admin: bool,
    project_admin: bool,
    role_permissions: Value,
    overrides: Value,
    in_root_project: bool,
}

impl Default for Membership {
    fn default() -> Self {
        Self {
            account_admin: false,
            project_admin: false,
            role_permissions: json!({}),
            overrides: json!({}),
            in_root_project: true,
        }
    }
}

fn provider(f: &Fixture, membership: Membership) -> InMemoryRbacStoreProvider {
    let mut data = InMemoryRbacData::new();
    data.insert(Resource::Account(f.account.clone()))
        .insert(Resource::Project(f.project.clone()))
        .insert(Resource::Project(f.child.clone()))
        .insert(Resource::User(f.user.clone()))
        .insert(Resource::User(f.superadmin.clone()))
        .insert(Resource::Dataset(f.dataset.clone()))
        .insert(Resource::Dataset(f.foreign_dataset.clone()))
        .insert(Resource::Application(f.ingest_app.clone()))
        .insert_user_account(UserAccount {
            id: f.user_account_id,
            user_id: f.user.id,
            account_id: f.account.id,
            is_admin: membership.account_admin,
        })
        .insert_user_project(UserProject {
            id: Uuid::new_v4(),
            user_id: f.user.id,
            project_id: f.child.id,
            is_admin: false,
            permission_overrides: json!({}),
        })
        .assign_role(
            Role {
                id: Uuid::new_v4(),
                name: "member".to_string(),
                permissions: membership.role_permissions,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            f.user_account_id,
        );
    if membership.in_root_project {
        data.insert_user_project(UserProject {
            id: Uuid::new_v4(),
            user_id: f.user.id,
            project_id: f.project.id,
            is_admin: membership.project_admin,
            permission_overrides: membership.overrides,
        });
    }
    InMemoryRbacStoreProvider::new(data)
}

fn validator() -> RbacValidator {
    RbacValidator::new(Arc::new(RbacSchemas::build().unwrap()))
}

fn scope(params: &[(&str, Uuid)]) -> ScopeContext {
    ScopeContext::from_params(
        params
            .iter()
            .map(|(name, id)| (name.to_string(), *id))
            .collect::<BTreeMap<_, _>>(),
    )
}

fn actions(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

fn dataset_reader() -> Value {
    json!({
        "ENTITY_Project": {
            "ACTION_READ": "Allow",
            "ENTITY_Dataset": { "ACTION_READ": "Allow" }
        }
    })
}

fn apikey(project_id: Uuid, permissions: Value) -> Apikey {
    Apikey {
        id: Uuid::new_v4(),
        name: "ci".to_string(),
        creator_id: Uuid::new_v4(),
        project_id,
        permissions_type: ApikeyPermissionsType::Custom,
        key_hash: String::new(),
        permissions,
        created_at: Utc::now(),
        expires_at: Utc::now() + Duration::days(30),
    }
}

#[tokio::test]
async fn test_superadmin_short_circuits() {
    let f = fixture();
    let provider = provider(&f, Membership::default());
    let store = provider.begin().await.unwrap();

    let info = validator()
        .validate_rbac_permissions(
            store.as_ref(),
            AuthenticatedEntity::User(f.superadmin.clone()),
            &scope(&[("project_id", f.project.id), ("dataset_id", f.dataset.id)]),
            ModelKind::Dataset,
            &actions(&["TAG"]),
        )
        .await
        .unwrap();
    assert!(info.is_superadmin());
    assert!(info.user_account.is_none());
    assert_eq!(info.account().map(|a| a.id), Some(f.account.id));
}

#[tokio::test]
async fn test_dataset_tag_requires_role_permission() {
    let f = fixture();
    let provider = provider(
        &f,
        Membership {
            role_permissions: dataset_reader(),
            ..Membership::default()
        },
    );
    let store = provider.begin().await.unwrap();
    let scope = scope(&[("project_id", f.project.id), ("dataset_id", f.dataset.id)]);
    let entity = AuthenticatedEntity::User(f.user.clone());

    validator()
        .validate_rbac_permissions(
            store.as_ref(),
            entity.clone(),
            &scope,
            ModelKind::Dataset,
            &actions(&["READ"]),
        )
        .await
        .unwrap();

    let err = validator()
        .validate_rbac_permissions(
            store.as_ref(),
            entity,
            &scope,
            ModelKind::Dataset,
            &actions(&["TAG"]),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);
    assert_eq!(
        err.message,
        format!(
            "you do not have superadmin/account-admin privileges and you do not have account-specific role-based access permissions to perform the action sequence - 'TAG' - on 'Dataset' resources in account - {}",
            f.account.id
        )
    );
}

#[tokio::test]
async fn test_account_admin_passes() {
    let f = fixture();
    let provider = provider(
        &f,
        Membership {
            account_admin: true,
            in_root_project: false,
            ..Membership::default()
        },
    );
    let store = provider.begin().await.unwrap();

    let info = validator()
        .validate_rbac_permissions(
            store.as_ref(),
            AuthenticatedEntity::User(f.user.clone()),
            &scope(&[("project_id", f.project.id), ("dataset_id", f.dataset.id)]),
            ModelKind::Dataset,
            &actions(&["TAG"]),
        )
        .await
        .unwrap();
    assert!(info.is_account_admin());
    assert!(info.user_project.is_none());
}

#[tokio::test]
async fn test_project_override_denies_unless_project_admin() {
    let f = fixture();
    let mut permissions = dataset_reader();
    permissions["ENTITY_Project"]["ENTITY_Dataset"]["ACTION_TAG"] = json!("Allow");
    let overrides = json!({ "ENTITY_Project": { "ENTITY_Dataset": { "ACTION_TAG": "Deny" } } });
    let scope = scope(&[("project_id", f.project.id), ("dataset_id", f.dataset.id)]);

    let denied = provider(
        &f,
        Membership {
            role_permissions: permissions.clone(),
            overrides: overrides.clone(),
            ..Membership::default()
        },
    );
    let store = denied.begin().await.unwrap();
    let err = validator()
        .validate_rbac_permissions(
            store.as_ref(),
            AuthenticatedEntity::User(f.user.clone()),
            &scope,
            ModelKind::Dataset,
            &actions(&["TAG"]),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);
    assert!(err.message.ends_with(&format!(
        "due to project-specific permission overrides in project - '{}'",
        f.project.id
    )));

    let admin = provider(
        &f,
        Membership {
            role_permissions: permissions,
            overrides,
            project_admin: true,
            ..Membership::default()
        },
    );
    let store = admin.begin().await.unwrap();
    let info = validator()
        .validate_rbac_permissions(
            store.as_ref(),
            AuthenticatedEntity::User(f.user.clone()),
            &scope,
            ModelKind::Dataset,
            &actions(&["TAG"]),
        )
        .await
        .unwrap();
    assert!(info.is_project_admin());
}

#[tokio::test]
async fn test_malformed_overrides_are_unavailable() {
    let f = fixture();
    let provider = provider(
        &f,
        Membership {
            role_permissions: dataset_reader(),
            overrides: json!({ "ENTITY_Project": { "ENTITY_Dataset": { "ACTION_READ": 42 } } }),
            ..Membership::default()
        },
    );
    let store = provider.begin().await.unwrap();
    let err = validator()
        .validate_rbac_permissions(
            store.as_ref(),
            AuthenticatedEntity::User(f.user.clone()),
            &scope(&[("project_id", f.project.id), ("dataset_id", f.dataset.id)]),
            ModelKind::Dataset,
            &actions(&["READ"]),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::ServiceUnavailable);
}

#[tokio::test]
async fn test_project_hierarchy_membership() {
    let f = fixture();
    let provider = provider(
        &f,
        Membership {
            role_permissions: dataset_reader(),
            in_root_project: false,
            ..Membership::default()
        },
    );
    let store = provider.begin().await.unwrap();
    let err = validator()
        .validate_rbac_permissions(
            store.as_ref(),
            AuthenticatedEntity::User(f.user.clone()),
            &scope(&[("project_id", f.child.id)]),
            ModelKind::Dataset,
            &actions(&["READ"]),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err.message,
        format!(
            "you are not assigned to one or more projects in the project hierarchy of parent project - '{}'",
            f.project.id
        )
    );
}

#[tokio::test]
async fn test_scope_errors() {
    let f = fixture();
    let provider = provider(&f, Membership::default());
    let store = provider.begin().await.unwrap();
    let v = validator();
    let entity = AuthenticatedEntity::User(f.user.clone());

    let missing = Uuid::new_v4();
    let err = v
        .validate_rbac_permissions(
            store.as_ref(),
            entity.clone(),
            &scope(&[("project_id", missing)]),
            ModelKind::Dataset,
            &actions(&["READ"]),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert_eq!(err.message, format!("Project - '{missing}' - not found"));

    let err = v
        .validate_rbac_permissions(
            store.as_ref(),
            entity.clone(),
            &scope(&[
                ("project_id", f.project.id),
                ("dataset_id", f.foreign_dataset.id),
            ]),
            ModelKind::Dataset,
            &actions(&["READ"]),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(
        err.message,
        format!(
            "Dataset - '{}' - is not associated to project_id - '{}'",
            f.foreign_dataset.id, f.project.id
        )
    );

    let err = v
        .validate_rbac_permissions(
            store.as_ref(),
            entity.clone(),
            &scope(&[]),
            ModelKind::Application,
            &actions(&["READ"]),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);
    assert_eq!(
        err.message,
        "you do not have superadmin permissions and must provide an account_id"
    );

    let err = v
        .validate_rbac_permissions(
            store.as_ref(),
            entity,
            &scope(&[("account_id", f.account.id), ("widget_id", Uuid::new_v4())]),
            ModelKind::Application,
            &actions(&["READ"]),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::ServiceUnavailable);
}

#[tokio::test]
async fn test_stranger_is_not_assigned() {
    let f = fixture();
    let provider = provider(&f, Membership::default());
    let store = provider.begin().await.unwrap();
    let stranger = user("stranger@elsewhere.test", false);

    let err = validator()
        .validate_rbac_permissions(
            store.as_ref(),
            AuthenticatedEntity::User(stranger),
            &scope(&[("account_id", f.account.id)]),
            ModelKind::Project,
            &actions(&["READ"]),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err.message,
        format!("you are not assigned to account - '{}'", f.account.id)
    );
}

#[tokio::test]
async fn test_typed_target_records_denials() {
    let f = fixture();
    let provider = provider(
        &f,
        Membership {
            role_permissions: json!({
                "ENTITY_Application": {
                    "TYPENAMES_applicationType": {
                        "TYPEVALUES_ingest": { "ACTION_READ": "Allow" }
                    }
                }
            }),
            ..Membership::default()
        },
    );
    let store = provider.begin().await.unwrap();

    let info = validator()
        .validate_rbac_permissions(
            store.as_ref(),
            AuthenticatedEntity::User(f.user.clone()),
            &scope(&[("account_id", f.account.id)]),
            ModelKind::Application,
            &actions(&["READ"]),
        )
        .await
        .unwrap();
    assert_eq!(info.target_typenames, vec!["applicationType"]);
    assert!(!info.is_type_denied(&actions(&["ingest"])));
    assert!(info.is_type_denied(&actions(&["preprocess"])));
    let denial = &info.type_denials["ENTITY_Application_TYPENAMES_applicationType_TYPEVALUES_preprocess"];
    assert!(denial.account.as_deref().is_some_and(|m| m.contains(
        "under the following configurations - (Resource - Application, Types - [applicationType:preprocess])"
    )));
    assert_eq!(
        info.denied_type_values(),
        BTreeMap::from([("applicationType".to_string(), vec!["preprocess".to_string()])])
    );
}

#[tokio::test]
async fn test_header_project_and_typed_path_for_instance_create() {
    let f = fixture();
    let permissions = json!({
        "ENTITY_Project": { "ACTION_READ": "Allow" },
        "ENTITY_Application": {
            "TYPENAMES_applicationType": {
                "TYPEVALUES_ingest": {
                    "ACTION_READ": "Allow",
                    "ENTITY_Instance": { "ACTION_CREATE": "Allow" }
                }
            }
        }
    });
    let scope = scope(&[
        ("project_id", f.project.id),
        ("application_id", f.ingest_app.id),
    ]);

    let allowed = provider(
        &f,
        Membership {
            role_permissions: permissions.clone(),
            ..Membership::default()
        },
    );
    let store = allowed.begin().await.unwrap();
    validator()
        .validate_rbac_permissions(
            store.as_ref(),
            AuthenticatedEntity::User(f.user.clone()),
            &scope,
            ModelKind::Instance,
            &actions(&["CREATE"]),
        )
        .await
        .unwrap();

    let overridden = provider(
        &f,
        Membership {
            role_permissions: permissions,
            overrides: json!({
                "ENTITY_Application": {
                    "TYPENAMES_applicationType": {
                        "TYPEVALUES_ingest": { "ENTITY_Instance": { "ACTION_CREATE": "Deny" } }
                    }
                }
            }),
            ..Membership::default()
        },
    );
    let store = overridden.begin().await.unwrap();
    let err = validator()
        .validate_rbac_permissions(
            store.as_ref(),
            AuthenticatedEntity::User(f.user.clone()),
            &scope,
            ModelKind::Instance,
            &actions(&["CREATE"]),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err.message,
        format!(
            "you are denied permissions to perform the action sequence - 'CREATE' - on 'Instance' resources under the following configurations - (Resource - Application, Types - [applicationType:ingest]) - due to project-specific permission overrides in project - '{}'",
            f.project.id
        )
    );
}

#[tokio::test]
async fn test_apikey_is_narrowed_to_its_project_and_permissions() {
    let f = fixture();
    let provider = provider(&f, Membership::default());
    let store = provider.begin().await.unwrap();
    let key = apikey(
        f.project.id,
        json!({ "ENTITY_Project": { "ENTITY_Dataset": { "ACTION_READ": "Allow" } } }),
    );
    let scope = scope(&[("project_id", f.project.id), ("dataset_id", f.dataset.id)]);
    let v = validator();

    v.validate_rbac_permissions(
        store.as_ref(),
        AuthenticatedEntity::Apikey(key.clone()),
        &scope,
        ModelKind::Dataset,
        &actions(&["READ"]),
    )
    .await
    .unwrap();

    let err = v
        .validate_rbac_permissions(
            store.as_ref(),
            AuthenticatedEntity::Apikey(key),
            &scope,
            ModelKind::Dataset,
            &actions(&["TAG"]),
        )
        .await
        .unwrap_err();
    assert!(err.message.contains("apikey-specific permission overrides"));

    let outsider = apikey(f.child.id, json!({}));
    let err = v
        .validate_rbac_permissions(
            store.as_ref(),
            AuthenticatedEntity::Apikey(outsider),
            &scope,
            ModelKind::Dataset,
            &actions(&["READ"]),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err.message,
        format!(
            "your permissions are restricted to resources within project - '{}'",
            f.child.id
        )
    );
}

#[tokio::test]
async fn test_store_failure_propagates() {
    let f = fixture();
    let provider = provider(&f, Membership::default());
    provider.fail_reads(true);
    let store = provider.begin().await.unwrap();

    let err = validator()
        .validate_rbac_permissions(
            store.as_ref(),
            AuthenticatedEntity::User(f.user.clone()),
            &scope(&[("account_id", f.account.id)]),
            ModelKind::Project,
            &actions(&["READ"]),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Database);
}

fn request(body: Value) -> PermissionsEvaluationRequest {
    serde_json::from_value(body).unwrap()
}

#[tokio::test]
async fn test_evaluate_for_member() {
    let f = fixture();
    let provider = provider(
        &f,
        Membership {
            role_permissions: dataset_reader(),
            ..Membership::default()
        },
    );
    let store = provider.begin().await.unwrap();

    let response = validator()
        .evaluate_rbac_permissions(
            store.as_ref(),
            &f.user,
            Some(f.account.id),
            Some(f.project.id),
            &request(json!({
                "IS_ACCOUNT_ADMIN": {},
                "PROJECT_READ": {},
                "DATASET_READ": {},
                "DATASET_TAG": {},
                "APPLICATION_READ": {}
            })),
        )
        .await
        .unwrap();
    let body = serde_json::to_value(&response).unwrap();

    assert_eq!(body["IS_ACCOUNT_ADMIN"], json!({ "OVERALL_PERMISSIONS": false }));
    assert_eq!(body["PROJECT_READ"], json!({ "OVERALL_PERMISSIONS": true }));
    assert_eq!(body["DATASET_READ"], json!({ "OVERALL_PERMISSIONS": true }));
    assert_eq!(body["DATASET_TAG"], json!({ "OVERALL_PERMISSIONS": false }));
    assert_eq!(
        body["APPLICATION_READ"],
        json!({
            "OVERALL_PERMISSIONS": false,
            "SPECIFIC_PERMISSIONS": { "applicationType": { "ingest": false, "preprocess": false } }
        })
    );
    assert_eq!(body["COLLECTION_READ"], "NOT_EVALUATED");
}

#[tokio::test]
async fn test_evaluate_for_superadmin_without_headers() {
    let f = fixture();
    let provider = provider(&f, Membership::default());
    let store = provider.begin().await.unwrap();

    let response = validator()
        .evaluate_rbac_permissions(
            store.as_ref(),
            &f.superadmin,
            None,
            None,
            &request(json!({ "DATASET_TAG": {}, "APPLICATION_READ": {} })),
        )
        .await
        .unwrap();
    let body = serde_json::to_value(&response).unwrap();
    assert_eq!(body["DATASET_TAG"]["OVERALL_PERMISSIONS"], true);
    assert_eq!(
        body["APPLICATION_READ"]["SPECIFIC_PERMISSIONS"]["applicationType"]["preprocess"],
        true
    );
}

#[tokio::test]
async fn test_evaluate_requires_project_header_for_project_fields() {
    let f = fixture();
    let provider = provider(&f, Membership::default());
    let store = provider.begin().await.unwrap();

    let err = validator()
        .evaluate_rbac_permissions(
            store.as_ref(),
            &f.user,
            Some(f.account.id),
            None,
            &request(json!({ "DATASET_TAG": {} })),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(
        err.message,
        "X-elevAIte-ProjectId is required to evaluate DATASET_TAG permissions for user"
    );

    let err = validator()
        .evaluate_rbac_permissions(store.as_ref(), &f.user, None, None, &request(json!({})))
        .await
        .unwrap_err();
    assert_eq!(err.message, "At least one field must be provided in payload");
}
