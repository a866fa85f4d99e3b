//! Mapping of permission objects between scopes.

use serde_json::{Map, Value};
use thiserror::Error;

use super::account::AccountScopedRbacPermission;
use super::apikey::ApikeyScopedRbacPermission;
use super::marker::{Allow, Deny};
use super::project::ProjectScopedRbacPermission;
use super::scope::RbacPermissionScope;
use super::{PermissionSchemaError, full_tree, parse_permissions};

/// Keys under `ENTITY_Project` that have no apikey-scope counterpart.
const PROJECT_ONLY_KEYS: [&str; 2] = ["ACTION_CREATE", "ENTITY_Apikey"];

/// Failures while mapping a permission object to apikey scope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeMappingError {
    /// The input did not validate against its declared scope.
    #[error("malformed {0} rbac permissions object: {1}")]
    Malformed(RbacPermissionScope, PermissionSchemaError),
    /// The mapped object is not a valid apikey-scoped tree.
    #[error("mapped apikey-scoped rbac permissions object is invalid: {0}")]
    Invalid(PermissionSchemaError),
}

impl From<ScopeMappingError> for elevaite_core::AppError {
    fn from(err: ScopeMappingError) -> Self {
        match err {
            ScopeMappingError::Malformed(..) => elevaite_core::AppError::validation(err.to_string()),
            ScopeMappingError::Invalid(_) => elevaite_core::AppError::internal(err.to_string()),
        }
    }
}

/// Reshape a permission object into a valid apikey-scoped object.
///
/// The input is validated against `scope` first. Account-scoped grants
/// lose application access and project-only keys, then keep the leaves the
/// apikey layout has. Project-scoped overrides deny leaves, so they map to
/// the apikey tree without those leaves. Apikey-scoped objects pass through.
/// Nodes left empty are dropped and the result always parses as
/// [`ApikeyScopedRbacPermission`].
pub fn map_to_apikey_scoped_permissions(
    permissions: Value,
    scope: RbacPermissionScope,
) -> Result<Value, ScopeMappingError> {
    let layout = full_tree::<ApikeyScopedRbacPermission>();
    let mapped = match scope {
        RbacPermissionScope::Account => {
            parse_permissions::<AccountScopedRbacPermission>(&permissions)
                .map_err(|e| ScopeMappingError::Malformed(scope, e))?;
            let mut permissions = permissions;
            if let Some(root) = permissions.as_object_mut() {
                root.remove("ENTITY_Application");
            }
            strip_project_only_keys(&mut permissions);
            retain_leaves(&layout, &mut Vec::new(), &|path: &[String]| {
                marker_at(&permissions, path) == Some(Allow::LITERAL)
            })
        }
        RbacPermissionScope::Project => {
            parse_permissions::<ProjectScopedRbacPermission>(&permissions)
                .map_err(|e| ScopeMappingError::Malformed(scope, e))?;
            let mut permissions = permissions;
            strip_project_only_keys(&mut permissions);
            retain_leaves(&layout, &mut Vec::new(), &|path: &[String]| {
                marker_at(&permissions, path) != Some(Deny::LITERAL)
            })
        }
        RbacPermissionScope::Apikey => {
            parse_permissions::<ApikeyScopedRbacPermission>(&permissions)
                .map_err(|e| ScopeMappingError::Malformed(scope, e))?;
            retain_leaves(&permissions, &mut Vec::new(), &|_: &[String]| true)
        }
    }
    .unwrap_or_else(|| Value::Object(Map::new()));

    parse_permissions::<ApikeyScopedRbacPermission>(&mapped).map_err(ScopeMappingError::Invalid)?;
    Ok(mapped)
}

fn strip_project_only_keys(permissions: &mut Value) {
    if let Some(project) = permissions
        .get_mut("ENTITY_Project")
        .and_then(Value::as_object_mut)
    {
        for key in PROJECT_ONLY_KEYS {
            project.remove(key);
        }
    }
}

fn marker_at<'a>(value: &'a Value, path: &[String]) -> Option<&'a str> {
    path.iter()
        .try_fold(value, |node, key| node.get(key))
        .and_then(Value::as_str)
}

/// Copy of `layout` holding only the leaves `keep` accepts, each set to
/// `"Allow"`. `None` when nothing is left.
fn retain_leaves(
    layout: &Value,
    path: &mut Vec<String>,
    keep: &dyn Fn(&[String]) -> bool,
) -> Option<Value> {
    match layout {
        Value::Object(children) => {
            let mut kept = Map::new();
            for (key, child) in children {
                path.push(key.clone());
                if let Some(child) = retain_leaves(child, path, keep) {
                    kept.insert(key.clone(), child);
                }
                path.pop();
            }
            (!kept.is_empty()).then_some(Value::Object(kept))
        }
        Value::String(_) => keep(path).then(|| Value::String(Allow::LITERAL.to_string())),
        _ => None,
    }
}
