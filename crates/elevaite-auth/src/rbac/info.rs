//! Result of a successful RBAC validation.

use std::collections::BTreeMap;

use elevaite_entity::account::Account;
use elevaite_entity::association::{UserAccount, UserProject};
use elevaite_entity::project::Project;
use elevaite_entity::{ModelKind, Resource};

use crate::identity::AuthenticatedEntity;

use super::schema::TypeValues;

/// Why one type branch of a typed target was denied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeDenial {
    pub account: Option<String>,
    pub project: Option<String>,
    pub apikey: Option<String>,
}

impl TypeDenial {
    pub fn is_denied(&self) -> bool {
        self.account.is_some() || self.project.is_some() || self.apikey.is_some()
    }

    /// The message reported when the denial is raised rather than recorded.
    pub fn message(&self) -> Option<&str> {
        self.account
            .as_deref()
            .or(self.project.as_deref())
            .or(self.apikey.as_deref())
    }
}

/// Key a type denial is recorded under.
pub fn type_denial_key(target: ModelKind, typenames: &[String], typevalues: &[String]) -> String {
    format!(
        "ENTITY_{target}_TYPENAMES_{}_TYPEVALUES_{}",
        typenames.join("_"),
        typevalues.join("_")
    )
}

/// Everything a handler may need after authorization.
#[derive(Debug, Clone)]
pub struct ValidationInfo {
    pub entity: AuthenticatedEntity,
    pub user_account: Option<UserAccount>,
    pub user_project: Option<UserProject>,
    pub resources: BTreeMap<ModelKind, Resource>,
    pub target: ModelKind,
    pub target_typenames: Vec<String>,
    pub target_typevalues: Vec<TypeValues>,
    pub type_denials: BTreeMap<String, TypeDenial>,
}

impl ValidationInfo {
    /// Outcome for endpoints that only require a valid principal.
    pub fn authenticated(entity: AuthenticatedEntity) -> Self {
        Self {
            entity,
            user_account: None,
            user_project: None,
            resources: BTreeMap::new(),
            target: ModelKind::User,
            target_typenames: Vec::new(),
            target_typevalues: Vec::new(),
            type_denials: BTreeMap::new(),
        }
    }

    pub fn resource(&self, kind: ModelKind) -> Option<&Resource> {
        self.resources.get(&kind)
    }

    pub fn account(&self) -> Option<&Account> {
        self.resource(ModelKind::Account).and_then(Resource::as_account)
    }

    pub fn project(&self) -> Option<&Project> {
        self.resource(ModelKind::Project).and_then(Resource::as_project)
    }

    pub fn is_superadmin(&self) -> bool {
        self.entity.is_superadmin()
    }

    pub fn is_account_admin(&self) -> bool {
        self.user_account.as_ref().is_some_and(|ua| ua.is_admin)
    }

    pub fn is_project_admin(&self) -> bool {
        self.user_project.as_ref().is_some_and(|up| up.is_admin)
    }

    /// Whether the given type-value combination of the target was denied.
    pub fn is_type_denied(&self, typevalues: &[String]) -> bool {
        let key = type_denial_key(self.target, &self.target_typenames, typevalues);
        self.type_denials.get(&key).is_some_and(TypeDenial::is_denied)
    }

    /// Denied values per type name, for excluding unauthorized types from
    /// list queries. Empty when nothing was denied.
    pub fn denied_type_values(&self) -> BTreeMap<String, Vec<String>> {
        let mut denied: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for combination in &self.target_typevalues {
            if !self.is_type_denied(combination) {
                continue;
            }
            for (name, value) in self.target_typenames.iter().zip(combination) {
                let values = denied.entry(name.clone()).or_default();
                if !values.contains(value) {
                    values.push(value.clone());
                }
            }
        }
        denied
    }
}
