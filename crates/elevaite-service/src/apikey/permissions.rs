//! Derivation of an API key's permissions from its creator's grants.

use serde_json::{Map, Value};

use elevaite_database::rbac::value_at_path;
use elevaite_entity::permission::Allow;
use elevaite_entity::role::Role;

/// Narrow an apikey-scoped tree to what the creator may do.
///
/// A leaf of `requested` survives when some role grants `"Allow"` at the
/// same path and `ceiling` (the creator's project overrides mapped to
/// apikey scope) holds it too. Without a ceiling only the roles decide.
/// Nodes left without children are dropped.
pub fn clone_permissions(requested: &Value, roles: &[Role], ceiling: Option<&Value>) -> Value {
    let allowed = |path: &[String]| {
        let granted = roles.iter().any(|role| {
            value_at_path(&role.permissions, path).and_then(Value::as_str) == Some(Allow::LITERAL)
        });
        let within = ceiling.is_none_or(|c| {
            value_at_path(c, path).and_then(Value::as_str) == Some(Allow::LITERAL)
        });
        granted && within
    };
    prune(requested, &mut Vec::new(), &allowed).unwrap_or_else(|| Value::Object(Map::new()))
}

/// Whether every leaf of `requested` is within the creator's grants.
pub fn within_grants(requested: &Value, roles: &[Role], ceiling: Option<&Value>) -> bool {
    clone_permissions(requested, roles, ceiling) == *requested
}

fn prune(node: &Value, path: &mut Vec<String>, allowed: &dyn Fn(&[String]) -> bool) -> Option<Value> {
    match node {
        Value::Object(children) => {
            let mut kept = Map::new();
            for (key, child) in children {
                path.push(key.clone());
                if let Some(child) = prune(child, path, allowed) {
                    kept.insert(key.clone(), child);
                }
                path.pop();
            }
            (!kept.is_empty()).then_some(Value::Object(kept))
        }
        Value::String(_) => allowed(path).then(|| node.clone()),
        _ => None,
    }
}
