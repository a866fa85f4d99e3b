//! Batch permission evaluation for a user.

use std::collections::BTreeMap;

use tracing::debug;
use uuid::Uuid;

use elevaite_core::{AppError, AppResult};
use elevaite_database::rbac::RbacStore;
use elevaite_entity::permission::RbacPermissionScope;
use elevaite_entity::permission::evaluation::{
    EvaluatedPermission, EvaluationField, FieldParams, PermissionsEvaluationRequest,
    PermissionsEvaluationResponse, parse_model_type_and_action_sequence,
    validate_permission_scope,
};
use elevaite_entity::user::User;
use elevaite_entity::{ModelKind, Resource};

use crate::identity::AuthenticatedEntity;

use super::info::type_denial_key;
use super::validator::{Associations, RbacValidator, check_inter_model_associations, unavailable};

/// Scope shared by every field of one evaluation request.
struct EvaluationScope {
    entity: AuthenticatedEntity,
    params: BTreeMap<String, Uuid>,
    resources: BTreeMap<ModelKind, Resource>,
    associations: Associations,
}

impl EvaluationScope {
    fn is_superadmin(&self) -> bool {
        self.entity.is_superadmin()
    }

    fn is_account_admin(&self) -> bool {
        self.associations
            .user_account
            .as_ref()
            .is_some_and(|ua| ua.is_admin)
    }
}

impl RbacValidator {
    /// Evaluate every requested field for `user` in the given scope.
    ///
    /// A field the user is forbidden from resolves to `false`; any other
    /// error fails the whole request.
    pub async fn evaluate_rbac_permissions(
        &self,
        store: &dyn RbacStore,
        user: &User,
        account_id: Option<Uuid>,
        project_id: Option<Uuid>,
        request: &PermissionsEvaluationRequest,
    ) -> AppResult<PermissionsEvaluationResponse> {
        request.validate()?;

        let mut params = BTreeMap::new();
        if let Some(id) = account_id {
            params.insert("account_id".to_string(), id);
        }
        if let Some(id) = project_id {
            params.insert("project_id".to_string(), id);
        }

        let mut resources = self.load_resources(store, &params).await?;
        self.derive_account(store, &mut resources, &mut params)
            .await?;
        check_inter_model_associations(&resources, &params)?;

        let entity = AuthenticatedEntity::User(user.clone());
        let associations = self
            .check_entity_associations(store, &entity, &resources)
            .await?;
        let scope = EvaluationScope {
            entity,
            params,
            resources,
            associations,
        };

        let mut response = PermissionsEvaluationResponse::default();
        for (field, field_params) in request.requested() {
            match self.evaluate_field(store, &scope, field, &field_params).await {
                Ok(permission) => response.set(field, permission),
                Err(err) if err.is_authorization() => {
                    debug!(field = %field, reason = %err.message, "Permission evaluated as denied");
                    response.set(
                        field,
                        EvaluatedPermission {
                            overall_permissions: false,
                            specific_permissions: None,
                        },
                    );
                }
                Err(err) => return Err(err),
            }
        }
        Ok(response)
    }

    async fn evaluate_field(
        &self,
        store: &dyn RbacStore,
        scope: &EvaluationScope,
        field: EvaluationField,
        field_params: &FieldParams,
    ) -> AppResult<EvaluatedPermission> {
        let has = |kind: ModelKind| scope.resources.contains_key(&kind);

        match field {
            EvaluationField::IsProjectAdmin => {
                if !has(ModelKind::Project) {
                    return Err(AppError::validation(
                        "X-elevAIte-ProjectId header is required to evaluate 'IS_PROJECT_ADMIN' permissions for user",
                    ));
                }
                let is_admin = scope
                    .associations
                    .user_project
                    .as_ref()
                    .is_some_and(|up| up.is_admin);
                return Ok(EvaluatedPermission::create(field, is_admin));
            }
            EvaluationField::IsAccountAdmin => {
                if !has(ModelKind::Account) {
                    return Err(AppError::validation(
                        "X-elevAIte-AccountId or X-elevAIte-ProjectId header is required to evaluate 'IS_ACCOUNT_ADMIN' permissions for user",
                    ));
                }
                return Ok(EvaluatedPermission::create(field, scope.is_account_admin()));
            }
            _ => {}
        }

        let name = field.as_str();
        let (model, actions) = parse_model_type_and_action_sequence(name);
        let target = ModelKind::from_loose_name(&model)
            .ok_or_else(|| unavailable(format!("no model for evaluation field '{name}'")))?;
        if !self.schemas().account.is_valid_action(target, &actions) {
            return Err(unavailable(format!(
                "evaluation field '{name}' names no account-scoped action"
            )));
        }

        let account_scoped = validate_permission_scope(name, RbacPermissionScope::Account);
        let project_scoped = validate_permission_scope(name, RbacPermissionScope::Project);
        if account_scoped {
            if !scope.is_superadmin() && !has(ModelKind::Account) {
                return Err(AppError::validation(format!(
                    "X-elevAIte-AccountId is required to evaluate {name} permissions for user"
                )));
            }
        } else if !scope.is_superadmin() && !scope.is_account_admin() && !has(ModelKind::Project) {
            return Err(AppError::validation(format!(
                "X-elevAIte-ProjectId is required to evaluate {name} permissions for user"
            )));
        }
        let account_only = account_scoped && !project_scoped;

        let mut resources = self.load_resources(store, field_params).await?;
        let mut all_params = field_params.clone();
        all_params.extend(scope.params.iter().map(|(k, v)| (k.clone(), *v)));
        check_inter_model_associations(&resources, &all_params)?;
        resources.extend(
            scope
                .resources
                .iter()
                .map(|(kind, resource)| (*kind, resource.clone())),
        );

        let mut associations = scope.associations.clone();
        if account_only {
            resources.remove(&ModelKind::Project);
            associations.user_project = None;
        }

        let outcome = self
            .check_permissions(store, &scope.entity, &associations, &resources, target, &actions)
            .await?;

        if scope.is_superadmin() || scope.is_account_admin() {
            return Ok(EvaluatedPermission::create(field, true));
        }

        if outcome.typenames.is_empty() {
            return Ok(EvaluatedPermission {
                overall_permissions: true,
                specific_permissions: None,
            });
        }

        let typenames_key = outcome.typenames.join("_");
        let mut per_type = BTreeMap::new();
        for combination in &outcome.typevalues {
            let key = type_denial_key(target, &outcome.typenames, combination);
            let denied = outcome
                .type_denials
                .get(&key)
                .is_some_and(|d| d.is_denied());
            per_type.insert(combination.join("_"), !denied);
        }
        let overall_permissions = per_type.values().any(|allowed| *allowed);
        Ok(EvaluatedPermission {
            overall_permissions,
            specific_permissions: Some(BTreeMap::from([(typenames_key, per_type)])),
        })
    }
}
