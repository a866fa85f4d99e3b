//! RBAC validation of one request.
//!
//! Validation runs in four steps: scope resolution, entity associations,
//! loading the remaining path params, and the permission walk. The walk
//! first checks `READ` on every loaded model in precedence order, then the
//! target action. Typed targets record per-type denials instead of failing.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info};
use uuid::Uuid;

use elevaite_core::{AppError, AppResult};
use elevaite_database::rbac::{RbacStore, value_at_path};
use elevaite_entity::association::{UserAccount, UserProject};
use elevaite_entity::permission::{
    ApikeyScopedRbacPermission, ProjectScopedRbacPermission, parse_permissions,
};
use elevaite_entity::{ModelKind, Resource};

use crate::identity::AuthenticatedEntity;

use super::context::ScopeContext;
use super::info::{TypeDenial, ValidationInfo, type_denial_key};
use super::messages::{self, DenialMessages};
use super::schema::{LeafKey, RbacSchemas, TypeValues};

const READ: &str = "READ";

/// Log the cause and return the generic 503.
pub(crate) fn unavailable(cause: impl std::fmt::Display) -> AppError {
    error!(cause = %cause, "RBAC validation failed on server state");
    AppError::service_unavailable()
}

/// Account and project memberships of the authenticated entity.
#[derive(Debug, Clone, Default)]
pub(crate) struct Associations {
    pub user_account: Option<UserAccount>,
    pub user_project: Option<UserProject>,
}

/// Permission-walk outcome carried into [`ValidationInfo`].
#[derive(Debug, Default)]
pub(crate) struct PermissionOutcome {
    pub typenames: Vec<String>,
    pub typevalues: Vec<TypeValues>,
    pub type_denials: BTreeMap<String, TypeDenial>,
}

/// Cumulative entities and type choices along one permission path.
#[derive(Debug, Clone, Default)]
struct PathChain {
    entities: Vec<ModelKind>,
    typenames: Vec<Vec<String>>,
    typevalues: Vec<TypeValues>,
}

impl PathChain {
    fn push(&mut self, kind: ModelKind, typenames: Vec<String>, typevalues: TypeValues) {
        self.entities.push(kind);
        self.typenames.push(typenames);
        self.typevalues.push(typevalues);
    }

    fn leaf_key(&self, actions: &[String]) -> LeafKey {
        LeafKey {
            entities: self.entities.clone(),
            typevalues: self.typevalues.clone(),
            actions: actions.to_vec(),
        }
    }

    fn configurations(&self) -> messages::Configurations {
        self.entities
            .iter()
            .zip(self.typenames.iter().zip(&self.typevalues))
            .map(|(kind, (names, values))| {
                (
                    *kind,
                    names.iter().cloned().zip(values.iter().cloned()).collect(),
                )
            })
            .collect()
    }
}

/// Whether a failed check raises or is only recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OnDenial {
    Raise,
    Record,
}

/// Evaluates RBAC permissions against the indexed permission trees.
#[derive(Debug, Clone)]
pub struct RbacValidator {
    schemas: Arc<RbacSchemas>,
}

impl RbacValidator {
    pub fn new(schemas: Arc<RbacSchemas>) -> Self {
        Self { schemas }
    }

    pub fn schemas(&self) -> &RbacSchemas {
        &self.schemas
    }

    /// Authorize `entity` to perform `actions` on `target` within `scope`.
    pub async fn validate_rbac_permissions(
        &self,
        store: &dyn RbacStore,
        entity: AuthenticatedEntity,
        scope: &ScopeContext,
        target: ModelKind,
        actions: &[String],
    ) -> AppResult<ValidationInfo> {
        let (resources, associations) = self.resolve_scope(store, &entity, scope).await?;
        let outcome = self
            .check_permissions(store, &entity, &associations, &resources, target, actions)
            .await?;

        debug!(
            entity = entity.kind(),
            entity_id = %entity.id(),
            target = %target,
            actions = %actions.join("."),
            denied_types = outcome.type_denials.len(),
            "RBAC validation passed"
        );

        Ok(ValidationInfo {
            entity,
            user_account: associations.user_account,
            user_project: associations.user_project,
            resources,
            target,
            target_typenames: outcome.typenames,
            target_typevalues: outcome.typevalues,
            type_denials: outcome.type_denials,
        })
    }

    /// Scope resolution and entity associations without a permission walk.
    ///
    /// Used by endpoints whose authorization is an admin check rather than a
    /// permission tree leaf.
    pub async fn validate_scope(
        &self,
        store: &dyn RbacStore,
        entity: AuthenticatedEntity,
        scope: &ScopeContext,
        target: ModelKind,
    ) -> AppResult<ValidationInfo> {
        let (resources, associations) = self.resolve_scope(store, &entity, scope).await?;
        Ok(ValidationInfo {
            entity,
            user_account: associations.user_account,
            user_project: associations.user_project,
            resources,
            target,
            target_typenames: Vec::new(),
            target_typevalues: Vec::new(),
            type_denials: BTreeMap::new(),
        })
    }

    async fn resolve_scope(
        &self,
        store: &dyn RbacStore,
        entity: &AuthenticatedEntity,
        scope: &ScopeContext,
    ) -> AppResult<(BTreeMap<ModelKind, Resource>, Associations)> {
        let mut params = scope.params().clone();
        let mut scope_params: BTreeMap<String, Uuid> = params
            .iter()
            .filter(|(name, _)| name.as_str() == "account_id" || name.as_str() == "project_id")
            .map(|(name, id)| (name.clone(), *id))
            .collect();

        let mut resources = self.load_resources(store, &scope_params).await?;
        self.derive_account(store, &mut resources, &mut scope_params)
            .await?;
        if let Some(account_id) = scope_params.get("account_id") {
            params.insert("account_id".to_string(), *account_id);
        }
        check_inter_model_associations(&resources, &scope_params)?;

        let associations = self
            .check_entity_associations(store, entity, &resources)
            .await?;

        let remaining: BTreeMap<String, Uuid> = params
            .iter()
            .filter(|(name, _)| !scope_params.contains_key(name.as_str()))
            .map(|(name, id)| (name.clone(), *id))
            .collect();
        resources.extend(self.load_resources(store, &remaining).await?);
        check_inter_model_associations(&resources, &params)?;

        Ok((resources, associations))
    }

    /// Load every `*_id` param's row.
    pub(crate) async fn load_resources(
        &self,
        store: &dyn RbacStore,
        params: &BTreeMap<String, Uuid>,
    ) -> AppResult<BTreeMap<ModelKind, Resource>> {
        let mut resources = BTreeMap::new();
        for (param, id) in params {
            let kind = ModelKind::from_id_param(param)
                .ok_or_else(|| unavailable(format!("no model for parameter '{param}'")))?;
            let resource = store
                .find_resource(kind, *id)
                .await?
                .ok_or_else(|| AppError::not_found(messages::not_found(kind, *id)))?;
            resources.insert(kind, resource);
        }
        Ok(resources)
    }

    /// Load the project's account when only a project is in scope.
    pub(crate) async fn derive_account(
        &self,
        store: &dyn RbacStore,
        resources: &mut BTreeMap<ModelKind, Resource>,
        scope_params: &mut BTreeMap<String, Uuid>,
    ) -> AppResult<()> {
        if scope_params.contains_key("account_id") {
            return Ok(());
        }
        let Some(account_id) = resources
            .get(&ModelKind::Project)
            .and_then(Resource::as_project)
            .map(|p| p.account_id)
        else {
            return Ok(());
        };
        let account = store
            .find_resource(ModelKind::Account, account_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(messages::not_found(ModelKind::Account, account_id))
            })?;
        resources.insert(ModelKind::Account, account);
        scope_params.insert("account_id".to_string(), account_id);
        Ok(())
    }

    pub(crate) async fn check_entity_associations(
        &self,
        store: &dyn RbacStore,
        entity: &AuthenticatedEntity,
        resources: &BTreeMap<ModelKind, Resource>,
    ) -> AppResult<Associations> {
        let project = resources
            .get(&ModelKind::Project)
            .and_then(Resource::as_project);

        match entity {
            AuthenticatedEntity::User(user) => {
                let mut associations = Associations::default();

                if let Some(account) = resources
                    .get(&ModelKind::Account)
                    .and_then(Resource::as_account)
                {
                    associations.user_account = store.find_user_account(user.id, account.id).await?;
                    if associations.user_account.is_none() && !user.is_superadmin {
                        return Err(AppError::authorization(messages::not_assigned_to_account(
                            account.id,
                        )));
                    }
                }

                let privileged = user.is_superadmin
                    || associations
                        .user_account
                        .as_ref()
                        .is_some_and(|ua| ua.is_admin);

                if let Some(project) = project {
                    associations.user_project = store.find_user_project(user.id, project.id).await?;
                    if associations.user_project.is_none() && !privileged {
                        return Err(AppError::authorization(messages::not_assigned_to_project(
                            project.id,
                        )));
                    }
                    if !privileged {
                        if let Some(parent_id) = project.parent_project_id {
                            if !store.is_assigned_to_project_chain(user.id, parent_id).await? {
                                return Err(AppError::authorization(
                                    messages::not_assigned_to_hierarchy(parent_id),
                                ));
                            }
                        }
                    }
                }

                Ok(associations)
            }
            AuthenticatedEntity::Apikey(apikey) => {
                if project.is_none_or(|p| p.id != apikey.project_id) {
                    return Err(AppError::authorization(messages::apikey_restricted(
                        apikey.project_id,
                    )));
                }
                Ok(Associations::default())
            }
        }
    }

    pub(crate) async fn check_permissions(
        &self,
        store: &dyn RbacStore,
        entity: &AuthenticatedEntity,
        associations: &Associations,
        resources: &BTreeMap<ModelKind, Resource>,
        target: ModelKind,
        actions: &[String],
    ) -> AppResult<PermissionOutcome> {
        let mut outcome = PermissionOutcome::default();

        let Some(account_id) = resources.get(&ModelKind::Account).map(Resource::id) else {
            if entity.is_superadmin() {
                return Ok(outcome);
            }
            return Err(AppError::authorization(messages::ACCOUNT_REQUIRED));
        };
        if entity.is_superadmin()
            || associations
                .user_account
                .as_ref()
                .is_some_and(|ua| ua.is_admin)
        {
            return Ok(outcome);
        }

        let account_schema = &self.schemas.account;
        if !account_schema.is_valid_action(target, actions) {
            return Err(unavailable(format!(
                "action sequence '{}' is not defined for {target}",
                actions.join(".")
            )));
        }
        let read = vec![READ.to_string()];
        let on_target_read_path = account_schema
            .path_entities(target, &read)
            .cloned()
            .ok_or_else(|| unavailable(format!("{target} has no READ permission")))?;

        let walk = PermissionWalk {
            validator: self,
            store,
            entity,
            associations,
            account_id,
            project_id: resources.get(&ModelKind::Project).map(Resource::id),
        };

        let mut path_chain = PathChain::default();
        let mut header_chain = PathChain::default();
        let mut target_loaded = false;

        for kind in ModelKind::VALIDATION_PRECEDENCE {
            let Some(resource) = resources.get(&kind) else {
                continue;
            };
            target_loaded |= kind == target;

            let typenames = account_schema.typenames(kind).to_vec();
            let typevalues = typenames
                .iter()
                .map(|name| {
                    resource.type_value(name).map(str::to_string).ok_or_else(|| {
                        unavailable(format!("{kind} has no type attribute '{name}'"))
                    })
                })
                .collect::<AppResult<TypeValues>>()?;

            let chain = if on_target_read_path.contains(&kind) {
                &mut path_chain
            } else {
                &mut header_chain
            };
            chain.push(kind, typenames, typevalues);
            walk.check(chain, kind, &read, false, OnDenial::Raise).await?;
        }

        if !target_loaded {
            let typenames = account_schema.typenames(target).to_vec();
            if typenames.is_empty() {
                path_chain.push(target, Vec::new(), Vec::new());
                walk.check(&path_chain, target, actions, true, OnDenial::Raise)
                    .await?;
            } else {
                outcome.typenames = typenames.clone();
                outcome.typevalues = account_schema.typevalues(target).to_vec();
                for combination in &outcome.typevalues {
                    let mut chain = path_chain.clone();
                    chain.push(target, typenames.clone(), combination.clone());
                    let denial = walk
                        .check(&chain, target, actions, true, OnDenial::Record)
                        .await?;
                    if denial.is_denied() {
                        info!(
                            target = %target,
                            types = %combination.join("_"),
                            "RBAC denied type branch"
                        );
                        outcome
                            .type_denials
                            .insert(type_denial_key(target, &typenames, combination), denial);
                    }
                }
            }
        } else if actions != read.as_slice() {
            walk.check(&path_chain, target, actions, true, OnDenial::Raise)
                .await?;
        }

        Ok(outcome)
    }
}

/// Per-request state of the permission walk.
struct PermissionWalk<'a> {
    validator: &'a RbacValidator,
    store: &'a dyn RbacStore,
    entity: &'a AuthenticatedEntity,
    associations: &'a Associations,
    account_id: Uuid,
    project_id: Option<Uuid>,
}

impl PermissionWalk<'_> {
    /// Check one leaf. `strict` makes a leaf missing from the apikey tree a
    /// denial instead of a skip.
    async fn check(
        &self,
        chain: &PathChain,
        target: ModelKind,
        actions: &[String],
        strict: bool,
        on_denial: OnDenial,
    ) -> AppResult<TypeDenial> {
        let schemas = &self.validator.schemas;
        let key = chain.leaf_key(actions);
        let path = schemas.account.leaf_path(&key).ok_or_else(|| {
            unavailable(format!(
                "no account-scoped path for {:?} {:?} {}",
                key.entities,
                key.typevalues,
                actions.join(".")
            ))
        })?;
        let messages = DenialMessages {
            target,
            actions,
            configurations: chain.configurations(),
            account_id: self.account_id,
            project_id: self.project_id,
        };

        let mut denial = TypeDenial::default();
        match self.entity {
            AuthenticatedEntity::User(_) => {
                let allowed = match &self.associations.user_account {
                    Some(ua) => self.store.role_allows(ua.id, path).await?,
                    None => false,
                };
                if !allowed {
                    denial.account = Some(messages.account());
                }
                if let Some(up) = &self.associations.user_project {
                    if !up.is_admin
                        && schemas.project.leaf_path(&key).is_some()
                        && overrides_deny(up, path)?
                    {
                        denial.project = Some(messages.project_override());
                    }
                }
            }
            AuthenticatedEntity::Apikey(apikey) => {
                if schemas.apikey.leaf_path(&key).is_some() {
                    parse_permissions::<ApikeyScopedRbacPermission>(&apikey.permissions).map_err(
                        |e| unavailable(format!("apikey '{}' has malformed permissions: {e}", apikey.id)),
                    )?;
                    if marker_at(&apikey.permissions, path) != Some("Allow") {
                        denial.apikey = Some(messages.apikey());
                    }
                } else if strict {
                    denial.apikey = Some(messages.apikey());
                }
            }
        }

        if on_denial == OnDenial::Raise {
            if let Some(message) = denial.message() {
                info!(
                    entity = self.entity.kind(),
                    entity_id = %self.entity.id(),
                    target = %target,
                    actions = %actions.join("."),
                    "RBAC denied"
                );
                return Err(AppError::authorization(message));
            }
        }
        Ok(denial)
    }
}

fn marker_at<'v>(permissions: &'v Value, path: &[String]) -> Option<&'v str> {
    value_at_path(permissions, path).and_then(Value::as_str)
}

fn overrides_deny(association: &UserProject, path: &[String]) -> AppResult<bool> {
    parse_permissions::<ProjectScopedRbacPermission>(&association.permission_overrides).map_err(
        |e| {
            unavailable(format!(
                "user '{}' has malformed permission overrides in project '{}': {e}",
                association.user_id, association.project_id
            ))
        },
    )?;
    Ok(marker_at(&association.permission_overrides, path) == Some("Deny"))
}

/// Every loaded model, in precedence order, must agree with each param it
/// has an attribute for.
pub(crate) fn check_inter_model_associations(
    resources: &BTreeMap<ModelKind, Resource>,
    params: &BTreeMap<String, Uuid>,
) -> AppResult<()> {
    for kind in ModelKind::VALIDATION_PRECEDENCE {
        let Some(resource) = resources.get(&kind) else {
            continue;
        };
        for (param, value) in params {
            if let Some(attribute) = resource.attribute(param) {
                if attribute != *value {
                    return Err(AppError::validation(messages::not_associated(
                        kind,
                        resource.id(),
                        param,
                        *value,
                    )));
                }
            }
        }
    }
    Ok(())
}
