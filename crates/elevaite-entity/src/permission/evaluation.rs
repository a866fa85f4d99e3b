//! Request and response shapes of batch permission evaluation.
//!
//! A client names the permissions it wants evaluated (one field per
//! endpoint family) together with the route params of that endpoint, minus
//! account and project which come from the request headers.

use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use elevaite_core::AppError;

use super::scope::RbacPermissionScope;

/// Evaluable permission fields, in response order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvaluationField {
    IsAccountAdmin,
    IsProjectAdmin,
    ApplicationRead,
    ProjectRead,
    ProjectCreate,
    ProjectServicenowTicketIngest,
    ApikeyRead,
    ApikeyCreate,
    DatasetRead,
    DatasetTag,
    CollectionRead,
    CollectionCreate,
    ConfigurationRead,
    ConfigurationCreate,
    ConfigurationUpdate,
    InstanceRead,
    InstanceCreate,
    InstanceConfigurationRead,
}

impl EvaluationField {
    pub const ALL: [EvaluationField; 18] = [
        Self::IsAccountAdmin,
        Self::IsProjectAdmin,
        Self::ApplicationRead,
        Self::ProjectRead,
        Self::ProjectCreate,
        Self::ProjectServicenowTicketIngest,
        Self::ApikeyRead,
        Self::ApikeyCreate,
        Self::DatasetRead,
        Self::DatasetTag,
        Self::CollectionRead,
        Self::CollectionCreate,
        Self::ConfigurationRead,
        Self::ConfigurationCreate,
        Self::ConfigurationUpdate,
        Self::InstanceRead,
        Self::InstanceCreate,
        Self::InstanceConfigurationRead,
    ];

    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IsAccountAdmin => "IS_ACCOUNT_ADMIN",
            Self::IsProjectAdmin => "IS_PROJECT_ADMIN",
            Self::ApplicationRead => "APPLICATION_READ",
            Self::ProjectRead => "PROJECT_READ",
            Self::ProjectCreate => "PROJECT_CREATE",
            Self::ProjectServicenowTicketIngest => "PROJECT_SERVICENOW_TICKET_INGEST",
            Self::ApikeyRead => "APIKEY_READ",
            Self::ApikeyCreate => "APIKEY_CREATE",
            Self::DatasetRead => "DATASET_READ",
            Self::DatasetTag => "DATASET_TAG",
            Self::CollectionRead => "COLLECTION_READ",
            Self::CollectionCreate => "COLLECTION_CREATE",
            Self::ConfigurationRead => "CONFIGURATION_READ",
            Self::ConfigurationCreate => "CONFIGURATION_CREATE",
            Self::ConfigurationUpdate => "CONFIGURATION_UPDATE",
            Self::InstanceRead => "INSTANCE_READ",
            Self::InstanceCreate => "INSTANCE_CREATE",
            Self::InstanceConfigurationRead => "INSTANCE_CONFIGURATION_READ",
        }
    }

    /// Whether this field asks about an admin flag rather than an action.
    pub fn is_admin_check(&self) -> bool {
        matches!(self, Self::IsAccountAdmin | Self::IsProjectAdmin)
    }
}

impl fmt::Display for EvaluationField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Split a field name into its model and action sequence.
///
/// `"INSTANCE_CONFIGURATION_READ"` yields `("INSTANCE", ["CONFIGURATION", "READ"])`.
pub fn parse_model_type_and_action_sequence(field_name: &str) -> (String, Vec<String>) {
    let mut parts = field_name.split('_');
    let model = parts.next().unwrap_or_default().to_string();
    (model, parts.map(str::to_string).collect())
}

/// Whether a field can be evaluated at the given scope.
///
/// Account-scope fields are answered from role permissions alone; project
/// scope ones also need a project to apply overrides and key restrictions.
pub fn validate_permission_scope(field_name: &str, scope: RbacPermissionScope) -> bool {
    use RbacPermissionScope::{Account, Project};
    match field_name {
        "APPLICATION_READ" | "PROJECT_READ" | "CONFIGURATION_READ" | "CONFIGURATION_CREATE"
        | "CONFIGURATION_UPDATE" => scope == Account,
        // created at the account root or inside a parent project
        "PROJECT_CREATE" => scope == Account || scope == Project,
        "PROJECT_SERVICENOW_TICKET_INGEST" | "APIKEY_READ" | "APIKEY_CREATE" | "DATASET_READ"
        | "DATASET_TAG" | "COLLECTION_READ" | "COLLECTION_CREATE" | "INSTANCE_READ"
        | "INSTANCE_CREATE" | "INSTANCE_CONFIGURATION_READ" => scope == Project,
        _ => false,
    }
}

/// Route params for fields without any.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoRouteParams {}

/// Route params for application-bound fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApplicationRouteParams {
    pub application_id: Uuid,
}

/// Body of `POST /auth/rbac-permissions`.
///
/// Params never carry `account_id` or `project_id`: those are resolved once
/// per request from the scope headers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct PermissionsEvaluationRequest {
    #[serde(default)]
    pub is_account_admin: Option<NoRouteParams>,
    #[serde(default)]
    pub is_project_admin: Option<NoRouteParams>,
    #[serde(default)]
    pub application_read: Option<NoRouteParams>,
    #[serde(default)]
    pub project_read: Option<NoRouteParams>,
    #[serde(default)]
    pub project_create: Option<NoRouteParams>,
    #[serde(default)]
    pub project_servicenow_ticket_ingest: Option<NoRouteParams>,
    #[serde(default)]
    pub apikey_read: Option<NoRouteParams>,
    #[serde(default)]
    pub apikey_create: Option<NoRouteParams>,
    #[serde(default)]
    pub dataset_read: Option<NoRouteParams>,
    #[serde(default)]
    pub dataset_tag: Option<NoRouteParams>,
    #[serde(default)]
    pub collection_read: Option<NoRouteParams>,
    #[serde(default)]
    pub collection_create: Option<NoRouteParams>,
    #[serde(default)]
    pub configuration_read: Option<ApplicationRouteParams>,
    #[serde(default)]
    pub configuration_create: Option<ApplicationRouteParams>,
    #[serde(default)]
    pub configuration_update: Option<ApplicationRouteParams>,
    #[serde(default)]
    pub instance_read: Option<ApplicationRouteParams>,
    #[serde(default)]
    pub instance_create: Option<ApplicationRouteParams>,
    #[serde(default)]
    pub instance_configuration_read: Option<ApplicationRouteParams>,
}

/// Route params of one requested field, keyed by param name.
pub type FieldParams = BTreeMap<String, Uuid>;

impl PermissionsEvaluationRequest {
    /// Reject a body that names no field at all.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.requested().is_empty() {
            return Err(AppError::validation(
                "At least one field must be provided in payload",
            ));
        }
        Ok(())
    }

    /// Requested fields and their params, in response order.
    pub fn requested(&self) -> Vec<(EvaluationField, FieldParams)> {
        fn plain(
            field: EvaluationField,
            value: &Option<NoRouteParams>,
        ) -> Option<(EvaluationField, FieldParams)> {
            value.as_ref().map(|_| (field, FieldParams::new()))
        }
        fn app(
            field: EvaluationField,
            value: &Option<ApplicationRouteParams>,
        ) -> Option<(EvaluationField, FieldParams)> {
            value.as_ref().map(|p| {
                let mut params = FieldParams::new();
                params.insert("application_id".to_string(), p.application_id);
                (field, params)
            })
        }

        use EvaluationField as F;
        [
            plain(F::IsAccountAdmin, &self.is_account_admin),
            plain(F::IsProjectAdmin, &self.is_project_admin),
            plain(F::ApplicationRead, &self.application_read),
            plain(F::ProjectRead, &self.project_read),
            plain(F::ProjectCreate, &self.project_create),
            plain(F::ProjectServicenowTicketIngest, &self.project_servicenow_ticket_ingest),
            plain(F::ApikeyRead, &self.apikey_read),
            plain(F::ApikeyCreate, &self.apikey_create),
            plain(F::DatasetRead, &self.dataset_read),
            plain(F::DatasetTag, &self.dataset_tag),
            plain(F::CollectionRead, &self.collection_read),
            plain(F::CollectionCreate, &self.collection_create),
            app(F::ConfigurationRead, &self.configuration_read),
            app(F::ConfigurationCreate, &self.configuration_create),
            app(F::ConfigurationUpdate, &self.configuration_update),
            app(F::InstanceRead, &self.instance_read),
            app(F::InstanceCreate, &self.instance_create),
            app(F::InstanceConfigurationRead, &self.instance_configuration_read),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

/// Per-type outcome map: typenames key to typevalues key to allowed.
pub type SpecificPermissions = BTreeMap<String, BTreeMap<String, bool>>;

/// Outcome of one evaluated field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct EvaluatedPermission {
    pub overall_permissions: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specific_permissions: Option<SpecificPermissions>,
}

impl EvaluatedPermission {
    /// Uniform outcome for `field`; typed fields get every type set to `allowed`.
    pub fn create(field: EvaluationField, allowed: bool) -> Self {
        let specific_permissions = match field {
            EvaluationField::ApplicationRead => {
                let values = ["ingest", "preprocess"]
                    .into_iter()
                    .map(|v| (v.to_string(), allowed))
                    .collect();
                Some(BTreeMap::from([("applicationType".to_string(), values)]))
            }
            _ => None,
        };
        Self {
            overall_permissions: allowed,
            specific_permissions,
        }
    }
}

/// A field's slot in the response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldEvaluation {
    #[default]
    NotEvaluated,
    Evaluated(EvaluatedPermission),
}

impl Serialize for FieldEvaluation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::NotEvaluated => serializer.serialize_str("NOT_EVALUATED"),
            Self::Evaluated(permission) => permission.serialize(serializer),
        }
    }
}

/// Body returned by `POST /auth/rbac-permissions`; every field is present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PermissionsEvaluationResponse {
    fields: BTreeMap<EvaluationField, FieldEvaluation>,
}

impl Default for PermissionsEvaluationResponse {
    fn default() -> Self {
        Self {
            fields: EvaluationField::ALL
                .into_iter()
                .map(|f| (f, FieldEvaluation::NotEvaluated))
                .collect(),
        }
    }
}

impl PermissionsEvaluationResponse {
    /// Record an outcome.
    pub fn set(&mut self, field: EvaluationField, permission: EvaluatedPermission) {
        self.fields.insert(field, FieldEvaluation::Evaluated(permission));
    }

    /// Current slot for a field.
    pub fn get(&self, field: EvaluationField) -> &FieldEvaluation {
        self.fields.get(&field).unwrap_or(&FieldEvaluation::NotEvaluated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_field_name() {
        let (model, actions) = parse_model_type_and_action_sequence("INSTANCE_CONFIGURATION_READ");
        assert_eq!(model, "INSTANCE");
        assert_eq!(actions, vec!["CONFIGURATION", "READ"]);

        let (model, actions) = parse_model_type_and_action_sequence("PROJECT_SERVICENOW_TICKET_INGEST");
        assert_eq!(model, "PROJECT");
        assert_eq!(actions, vec!["SERVICENOW", "TICKET", "INGEST"]);
    }

    #[test]
    fn test_permission_scope_table() {
        use RbacPermissionScope::*;
        assert!(!validate_permission_scope("DATASET_TAG", Account));
        assert!(validate_permission_scope("DATASET_TAG", Project));
        assert!(validate_permission_scope("PROJECT_CREATE", Account));
        assert!(validate_permission_scope("PROJECT_CREATE", Project));
        assert!(validate_permission_scope("CONFIGURATION_UPDATE", Account));
        assert!(!validate_permission_scope("CONFIGURATION_UPDATE", Project));
        assert!(!validate_permission_scope("IS_ACCOUNT_ADMIN", Account));
        assert!(!validate_permission_scope("PROJECT_READ", Apikey));
    }

    #[test]
    fn test_empty_request_is_rejected() {
        let request: PermissionsEvaluationRequest = serde_json::from_value(json!({})).unwrap();
        let err = request.validate().unwrap_err();
        assert_eq!(err.message, "At least one field must be provided in payload");

        let request: PermissionsEvaluationRequest =
            serde_json::from_value(json!({ "DATASET_TAG": null })).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_scope_ids_are_not_route_params() {
        assert!(serde_json::from_value::<PermissionsEvaluationRequest>(json!({
            "DATASET_READ": { "project_id": "7d3c4f0e-9d4e-4a9b-8d8f-3f1ad6a1d001" }
        }))
        .is_err());
        assert!(serde_json::from_value::<PermissionsEvaluationRequest>(json!({
            "INSTANCE_READ": {
                "application_id": "7d3c4f0e-9d4e-4a9b-8d8f-3f1ad6a1d001",
                "account_id": "7d3c4f0e-9d4e-4a9b-8d8f-3f1ad6a1d002"
            }
        }))
        .is_err());
        assert!(serde_json::from_value::<PermissionsEvaluationRequest>(json!({ "MODEL_READ": {} })).is_err());
    }

    #[test]
    fn test_requested_carries_params() {
        let app_id = Uuid::new_v4();
        let request: PermissionsEvaluationRequest = serde_json::from_value(json!({
            "PROJECT_READ": {},
            "CONFIGURATION_READ": { "application_id": app_id }
        }))
        .unwrap();
        let requested = request.requested();
        assert_eq!(requested.len(), 2);
        assert_eq!(requested[0].0, EvaluationField::ProjectRead);
        assert_eq!(requested[1].1["application_id"], app_id);
    }

    #[test]
    fn test_response_defaults_to_not_evaluated() {
        let mut response = PermissionsEvaluationResponse::default();
        response.set(
            EvaluationField::ApplicationRead,
            EvaluatedPermission::create(EvaluationField::ApplicationRead, true),
        );
        let body = serde_json::to_value(&response).unwrap();
        assert_eq!(body.as_object().unwrap().len(), 18);
        assert_eq!(body["DATASET_TAG"], "NOT_EVALUATED");
        assert_eq!(body["APPLICATION_READ"]["OVERALL_PERMISSIONS"], true);
        assert_eq!(
            body["APPLICATION_READ"]["SPECIFIC_PERMISSIONS"]["applicationType"]["preprocess"],
            true
        );
    }
}
