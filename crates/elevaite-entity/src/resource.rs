//! Model kinds known to the RBAC layer and a sum type over loaded rows.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::account::Account;
use crate::apikey::Apikey;
use crate::application::{Application, Configuration, Instance};
use crate::collection::Collection;
use crate::dataset::Dataset;
use crate::project::Project;
use crate::user::User;

/// Every model the RBAC layer can load by id or name in a permission path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModelKind {
    Account,
    Project,
    User,
    Application,
    Instance,
    Configuration,
    Dataset,
    Collection,
    Apikey,
}

impl ModelKind {
    /// Order in which loaded models have their `READ` permission verified.
    ///
    /// Accounts are never checked here: account membership is an entity
    /// association, not a permission.
    pub const VALIDATION_PRECEDENCE: [ModelKind; 7] = [
        Self::Project,
        Self::Application,
        Self::Configuration,
        Self::Instance,
        Self::Dataset,
        Self::Collection,
        Self::Apikey,
    ];

    /// Name as it appears after `ENTITY_` in permission keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Account => "Account",
            Self::Project => "Project",
            Self::User => "User",
            Self::Application => "Application",
            Self::Instance => "Instance",
            Self::Configuration => "Configuration",
            Self::Dataset => "Dataset",
            Self::Collection => "Collection",
            Self::Apikey => "Apikey",
        }
    }

    /// Resolve a model from its permission-key name (`"Project"`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Account" => Some(Self::Account),
            "Project" => Some(Self::Project),
            "User" => Some(Self::User),
            "Application" => Some(Self::Application),
            "Instance" => Some(Self::Instance),
            "Configuration" => Some(Self::Configuration),
            "Dataset" => Some(Self::Dataset),
            "Collection" => Some(Self::Collection),
            "Apikey" => Some(Self::Apikey),
            _ => None,
        }
    }

    /// Resolve a model from a loosely-cased name (`"PROJECT"`, `"dataset"`).
    pub fn from_loose_name(name: &str) -> Option<Self> {
        Self::from_name(&capitalize(name))
    }

    /// Resolve a model from an `<model>_id` parameter name.
    pub fn from_id_param(param: &str) -> Option<Self> {
        param.strip_suffix("_id").and_then(Self::from_loose_name)
    }

    /// Parameter name carrying this model's id (`"project_id"`).
    pub fn id_param(&self) -> String {
        format!("{}_id", self.as_str().to_lowercase())
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First letter upper-cased, the rest lower-cased.
fn capitalize(name: &str) -> String {
    let lower = name.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// A loaded row of any RBAC-relevant model.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Resource {
    Account(Account),
    Project(Project),
    User(User),
    Application(Application),
    Instance(Instance),
    Configuration(Configuration),
    Dataset(Dataset),
    Collection(Collection),
    Apikey(Apikey),
}

impl Resource {
    /// The model this row belongs to.
    pub fn kind(&self) -> ModelKind {
        match self {
            Self::Account(_) => ModelKind::Account,
            Self::Project(_) => ModelKind::Project,
            Self::User(_) => ModelKind::User,
            Self::Application(_) => ModelKind::Application,
            Self::Instance(_) => ModelKind::Instance,
            Self::Configuration(_) => ModelKind::Configuration,
            Self::Dataset(_) => ModelKind::Dataset,
            Self::Collection(_) => ModelKind::Collection,
            Self::Apikey(_) => ModelKind::Apikey,
        }
    }

    /// Primary key.
    pub fn id(&self) -> Uuid {
        match self {
            Self::Account(r) => r.id,
            Self::Project(r) => r.id,
            Self::User(r) => r.id,
            Self::Application(r) => r.id,
            Self::Instance(r) => r.id,
            Self::Configuration(r) => r.id,
            Self::Dataset(r) => r.id,
            Self::Collection(r) => r.id,
            Self::Apikey(r) => r.id,
        }
    }

    /// Foreign-key attribute named like a request parameter, if the model
    /// has one.
    pub fn attribute(&self, param: &str) -> Option<Uuid> {
        match (self, param) {
            (Self::Project(p), "account_id") => Some(p.account_id),
            (Self::Instance(i), "application_id") => Some(i.application_id),
            (Self::Instance(i), "configuration_id") => Some(i.configuration_id),
            (Self::Instance(i), "project_id") => Some(i.project_id),
            (Self::Configuration(c), "application_id") => Some(c.application_id),
            (Self::Dataset(d), "project_id") => Some(d.project_id),
            (Self::Collection(c), "project_id") => Some(c.project_id),
            (Self::Apikey(a), "project_id") => Some(a.project_id),
            _ => None,
        }
    }

    /// Value of a type-branch attribute (`applicationType`) on typed models.
    pub fn type_value(&self, typename: &str) -> Option<&'static str> {
        match (self, typename) {
            (Self::Application(a), "applicationType") => Some(a.application_type.as_str()),
            _ => None,
        }
    }

    /// Borrow as a project.
    pub fn as_project(&self) -> Option<&Project> {
        match self {
            Self::Project(p) => Some(p),
            _ => None,
        }
    }

    /// Borrow as an account.
    pub fn as_account(&self) -> Option<&Account> {
        match self {
            Self::Account(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_user(&self) -> Option<&User> {
        match self {
            Self::User(u) => Some(u),
            _ => None,
        }
    }

    pub fn as_application(&self) -> Option<&Application> {
        match self {
            Self::Application(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_configuration(&self) -> Option<&Configuration> {
        match self {
            Self::Configuration(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Self::Instance(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_dataset(&self) -> Option<&Dataset> {
        match self {
            Self::Dataset(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_apikey(&self) -> Option<&Apikey> {
        match self {
            Self::Apikey(a) => Some(a),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_id_param() {
        assert_eq!(ModelKind::from_id_param("project_id"), Some(ModelKind::Project));
        assert_eq!(ModelKind::from_id_param("apikey_id"), Some(ModelKind::Apikey));
        assert_eq!(ModelKind::from_id_param("widget_id"), None);
        assert_eq!(ModelKind::from_id_param("project"), None);
    }

    #[test]
    fn test_loose_name_is_capitalized() {
        assert_eq!(ModelKind::from_loose_name("DATASET"), Some(ModelKind::Dataset));
        assert_eq!(ModelKind::from_loose_name("instance"), Some(ModelKind::Instance));
        assert_eq!(ModelKind::Configuration.id_param(), "configuration_id");
    }

    #[test]
    fn test_precedence_excludes_account() {
        assert!(!ModelKind::VALIDATION_PRECEDENCE.contains(&ModelKind::Account));
        assert_eq!(ModelKind::VALIDATION_PRECEDENCE[0], ModelKind::Project);
    }
}
