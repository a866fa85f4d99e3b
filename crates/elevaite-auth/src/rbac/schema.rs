//! Index over the fully populated permission trees.
//!
//! Walking a tree records, for every leaf action, the key path that leads to
//! it. A leaf is addressed by the entities on its path, the type values
//! chosen for each of those entities (empty for untyped ones) and the action
//! sequence under the last entity.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde_json::Value;
use thiserror::Error;

use elevaite_core::AppError;
use elevaite_entity::ModelKind;
use elevaite_entity::permission::{
    ACTION_PREFIX, AccountScopedRbacPermission, ApikeyScopedRbacPermission, ENTITY_PREFIX,
    ProjectScopedRbacPermission, RbacPermissionScope, TYPE_SEPARATOR, TYPENAMES_PREFIX,
    TYPEVALUES_PREFIX, full_tree,
};

/// One type-value combination of a typed entity (`["ingest"]`).
pub type TypeValues = Vec<String>;

/// An action sequence (`["CONFIGURATION", "READ"]`).
pub type ActionSequence = Vec<String>;

/// Address of a leaf action in a tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LeafKey {
    pub entities: Vec<ModelKind>,
    pub typevalues: Vec<TypeValues>,
    pub actions: ActionSequence,
}

/// Failure to index a tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaIndexError {
    #[error("permission key '{0}' has no known prefix")]
    UnknownPrefix(String),
    #[error("permission key '{0}' names an unknown entity")]
    UnknownEntity(String),
    #[error("permission key '{0}' appears outside of any entity")]
    Orphan(String),
    #[error("permission tree for {0} is not an object")]
    NotAnObject(RbacPermissionScope),
}

impl From<SchemaIndexError> for AppError {
    fn from(err: SchemaIndexError) -> Self {
        AppError::configuration(err.to_string())
    }
}

/// Lookup tables for one scope's tree.
#[derive(Debug, Clone, Default)]
pub struct SchemaIndex {
    leaf_paths: HashMap<LeafKey, Vec<String>>,
    valid_actions: HashMap<ModelKind, HashSet<ActionSequence>>,
    typenames: HashMap<ModelKind, Vec<String>>,
    typevalues: HashMap<ModelKind, Vec<TypeValues>>,
    path_entities: HashMap<(ModelKind, ActionSequence), BTreeSet<ModelKind>>,
}

/// Walk state; every vector is pushed on the way down and popped on the way up.
#[derive(Default)]
struct Cursor {
    entities: Vec<ModelKind>,
    typevalues: Vec<TypeValues>,
    actions: ActionSequence,
    path: Vec<String>,
}

impl SchemaIndex {
    /// Index a fully populated tree.
    pub fn build(tree: &Value, scope: RbacPermissionScope) -> Result<Self, SchemaIndexError> {
        let object = tree
            .as_object()
            .ok_or(SchemaIndexError::NotAnObject(scope))?;
        let mut index = Self::default();
        index.walk(object, &mut Cursor::default())?;
        Ok(index)
    }

    fn walk(
        &mut self,
        node: &serde_json::Map<String, Value>,
        cursor: &mut Cursor,
    ) -> Result<(), SchemaIndexError> {
        for (key, value) in node {
            cursor.path.push(key.clone());

            if let Some(name) = key.strip_prefix(ENTITY_PREFIX) {
                let entity = ModelKind::from_name(name)
                    .ok_or_else(|| SchemaIndexError::UnknownEntity(key.clone()))?;
                cursor.entities.push(entity);
                cursor.typevalues.push(TypeValues::new());
                self.descend(value, cursor)?;
                cursor.typevalues.pop();
                cursor.entities.pop();
            } else if let Some(names) = key.strip_prefix(TYPENAMES_PREFIX) {
                let entity = current_entity(cursor, key)?;
                self.typenames
                    .entry(entity)
                    .or_insert_with(|| split_types(names));
                self.descend(value, cursor)?;
            } else if let Some(values) = key.strip_prefix(TYPEVALUES_PREFIX) {
                let entity = current_entity(cursor, key)?;
                let values = split_types(values);
                let known = self.typevalues.entry(entity).or_default();
                if !known.contains(&values) {
                    known.push(values.clone());
                }
                let previous = cursor
                    .typevalues
                    .last_mut()
                    .map(|slot| std::mem::replace(slot, values))
                    .unwrap_or_default();
                self.descend(value, cursor)?;
                if let Some(slot) = cursor.typevalues.last_mut() {
                    *slot = previous;
                }
            } else if let Some(action) = key.strip_prefix(ACTION_PREFIX) {
                let entity = current_entity(cursor, key)?;
                cursor.actions.push(action.to_string());
                if value.is_object() {
                    self.descend(value, cursor)?;
                } else {
                    self.record_leaf(entity, cursor);
                }
                cursor.actions.pop();
            } else {
                return Err(SchemaIndexError::UnknownPrefix(key.clone()));
            }

            cursor.path.pop();
        }
        Ok(())
    }

    fn descend(&mut self, value: &Value, cursor: &mut Cursor) -> Result<(), SchemaIndexError> {
        match value.as_object() {
            Some(child) => self.walk(child, cursor),
            None => Ok(()),
        }
    }

    fn record_leaf(&mut self, entity: ModelKind, cursor: &Cursor) {
        self.valid_actions
            .entry(entity)
            .or_default()
            .insert(cursor.actions.clone());
        self.path_entities.insert(
            (entity, cursor.actions.clone()),
            cursor.entities.iter().copied().collect(),
        );
        self.leaf_paths.insert(
            LeafKey {
                entities: cursor.entities.clone(),
                typevalues: cursor.typevalues.clone(),
                actions: cursor.actions.clone(),
            },
            cursor.path.clone(),
        );
    }

    /// Key path of a leaf.
    pub fn leaf_path(&self, key: &LeafKey) -> Option<&[String]> {
        self.leaf_paths.get(key).map(Vec::as_slice)
    }

    /// Whether `actions` is a leaf action sequence of `entity` anywhere in the tree.
    pub fn is_valid_action(&self, entity: ModelKind, actions: &[String]) -> bool {
        self.valid_actions
            .get(&entity)
            .is_some_and(|set| set.iter().any(|a| a.as_slice() == actions))
    }

    /// Attribute names that select an entity's type branch.
    pub fn typenames(&self, entity: ModelKind) -> &[String] {
        self.typenames.get(&entity).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Type-value combinations of an entity, in tree order.
    pub fn typevalues(&self, entity: ModelKind) -> &[TypeValues] {
        self.typevalues.get(&entity).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_typed(&self, entity: ModelKind) -> bool {
        self.typenames.contains_key(&entity)
    }

    /// Entities on the key path of `(entity, actions)`.
    pub fn path_entities(&self, entity: ModelKind, actions: &[String]) -> Option<&BTreeSet<ModelKind>> {
        self.path_entities.get(&(entity, actions.to_vec()))
    }

    /// Number of indexed leaves.
    pub fn len(&self) -> usize {
        self.leaf_paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaf_paths.is_empty()
    }

    /// Every indexed key path.
    pub fn leaf_paths(&self) -> impl Iterator<Item = &[String]> {
        self.leaf_paths.values().map(Vec::as_slice)
    }
}

fn current_entity(cursor: &Cursor, key: &str) -> Result<ModelKind, SchemaIndexError> {
    cursor
        .entities
        .last()
        .copied()
        .ok_or_else(|| SchemaIndexError::Orphan(key.to_string()))
}

fn split_types(raw: &str) -> Vec<String> {
    raw.split(TYPE_SEPARATOR).map(str::to_string).collect()
}

/// Indexes of the three scoped trees, built once at startup.
#[derive(Debug, Clone)]
pub struct RbacSchemas {
    pub account: SchemaIndex,
    pub project: SchemaIndex,
    pub apikey: SchemaIndex,
}

impl RbacSchemas {
    pub fn build() -> Result<Self, SchemaIndexError> {
        let schemas = Self {
            account: SchemaIndex::build(
                &full_tree::<AccountScopedRbacPermission>(),
                RbacPermissionScope::Account,
            )?,
            project: SchemaIndex::build(
                &full_tree::<ProjectScopedRbacPermission>(),
                RbacPermissionScope::Project,
            )?,
            apikey: SchemaIndex::build(
                &full_tree::<ApikeyScopedRbacPermission>(),
                RbacPermissionScope::Apikey,
            )?,
        };
        tracing::debug!(
            account_leaves = schemas.account.len(),
            project_leaves = schemas.project.len(),
            apikey_leaves = schemas.apikey.len(),
            "Indexed RBAC permission schemas"
        );
        Ok(schemas)
    }

    pub fn for_scope(&self, scope: RbacPermissionScope) -> &SchemaIndex {
        match scope {
            RbacPermissionScope::Account => &self.account,
            RbacPermissionScope::Project => &self.project,
            RbacPermissionScope::Apikey => &self.apikey,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn seq(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    fn key(entities: &[ModelKind], typevalues: &[&[&str]], actions: &[&str]) -> LeafKey {
        LeafKey {
            entities: entities.to_vec(),
            typevalues: typevalues.iter().map(|v| seq(v)).collect(),
            actions: seq(actions),
        }
    }

    #[test]
    fn test_account_tree_paths() {
        let schemas = RbacSchemas::build().unwrap();
        let account = &schemas.account;

        assert_eq!(
            account.leaf_path(&key(&[ModelKind::Project], &[&[]], &["READ"])),
            Some(seq(&["ENTITY_Project", "ACTION_READ"]).as_slice())
        );
        assert_eq!(
            account.leaf_path(&key(
                &[ModelKind::Project, ModelKind::Dataset],
                &[&[], &[]],
                &["TAG"]
            )),
            Some(seq(&["ENTITY_Project", "ENTITY_Dataset", "ACTION_TAG"]).as_slice())
        );
        assert_eq!(
            account.leaf_path(&key(
                &[ModelKind::Project],
                &[&[]],
                &["SERVICENOW", "TICKET", "INGEST"]
            )),
            Some(
                seq(&[
                    "ENTITY_Project",
                    "ACTION_SERVICENOW",
                    "ACTION_TICKET",
                    "ACTION_INGEST"
                ])
                .as_slice()
            )
        );
        assert_eq!(
            account.leaf_path(&key(
                &[ModelKind::Application, ModelKind::Instance],
                &[&["preprocess"], &[]],
                &["CONFIGURATION", "READ"]
            )),
            Some(
                seq(&[
                    "ENTITY_Application",
                    "TYPENAMES_applicationType",
                    "TYPEVALUES_preprocess",
                    "ENTITY_Instance",
                    "ACTION_CONFIGURATION",
                    "ACTION_READ"
                ])
                .as_slice()
            )
        );
    }

    #[test]
    fn test_account_tree_types_and_actions() {
        let account = RbacSchemas::build().unwrap().account;
        assert_eq!(account.typenames(ModelKind::Application), seq(&["applicationType"]).as_slice());
        assert_eq!(
            account.typevalues(ModelKind::Application),
            &[seq(&["ingest"]), seq(&["preprocess"])]
        );
        assert!(!account.is_typed(ModelKind::Instance));
        assert!(account.is_valid_action(ModelKind::Instance, &seq(&["CONFIGURATION", "READ"])));
        assert!(!account.is_valid_action(ModelKind::Dataset, &seq(&["CREATE"])));

        let entities = account
            .path_entities(ModelKind::Instance, &seq(&["READ"]))
            .unwrap();
        assert!(entities.contains(&ModelKind::Application));
        assert!(!entities.contains(&ModelKind::Project));
    }

    #[test]
    fn test_narrower_trees() {
        let schemas = RbacSchemas::build().unwrap();
        let project_read = key(&[ModelKind::Project], &[&[]], &["READ"]);
        assert!(schemas.account.leaf_path(&project_read).is_some());
        assert!(schemas.project.leaf_path(&project_read).is_none());

        let project_create = key(&[ModelKind::Project], &[&[]], &["CREATE"]);
        assert!(schemas.project.leaf_path(&project_create).is_some());
        assert!(schemas.apikey.leaf_path(&project_create).is_none());

        let dataset_tag = key(
            &[ModelKind::Project, ModelKind::Dataset],
            &[&[], &[]],
            &["TAG"],
        );
        assert!(schemas.apikey.leaf_path(&dataset_tag).is_some());
        assert!(schemas.account.len() > schemas.apikey.len());
    }

    #[test]
    fn test_invalid_trees() {
        let err = SchemaIndex::build(&json!({ "ENTITY_Model": {} }), RbacPermissionScope::Account)
            .unwrap_err();
        assert_eq!(err, SchemaIndexError::UnknownEntity("ENTITY_Model".to_string()));

        let err = SchemaIndex::build(
            &json!({ "ENTITY_Project": { "READ": "Allow" } }),
            RbacPermissionScope::Account,
        )
        .unwrap_err();
        assert_eq!(err, SchemaIndexError::UnknownPrefix("READ".to_string()));

        let err = SchemaIndex::build(&json!({ "ACTION_READ": "Allow" }), RbacPermissionScope::Account)
            .unwrap_err();
        assert_eq!(err, SchemaIndexError::Orphan("ACTION_READ".to_string()));
    }
}
