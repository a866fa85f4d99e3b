//! Client-facing RBAC error messages.

use uuid::Uuid;

use elevaite_entity::ModelKind;

/// Typed models on a permission path with their chosen type values.
pub(crate) type Configurations = Vec<(ModelKind, Vec<(String, String)>)>;

pub(crate) fn not_found(kind: ModelKind, id: Uuid) -> String {
    format!("{kind} - '{id}' - not found")
}

pub(crate) fn not_associated(kind: ModelKind, id: Uuid, param: &str, value: Uuid) -> String {
    format!("{kind} - '{id}' - is not associated to {param} - '{value}'")
}

pub(crate) fn not_assigned_to_account(account_id: Uuid) -> String {
    format!("you are not assigned to account - '{account_id}'")
}

pub(crate) fn not_assigned_to_project(project_id: Uuid) -> String {
    format!("you are not assigned to project - '{project_id}'")
}

pub(crate) fn not_assigned_to_hierarchy(parent_project_id: Uuid) -> String {
    format!(
        "you are not assigned to one or more projects in the project hierarchy of parent project - '{parent_project_id}'"
    )
}

pub(crate) fn apikey_restricted(project_id: Uuid) -> String {
    format!("your permissions are restricted to resources within project - '{project_id}'")
}

pub(crate) const ACCOUNT_REQUIRED: &str =
    "you do not have superadmin permissions and must provide an account_id";

/// Builds the three denial messages of one permission check.
pub(crate) struct DenialMessages<'a> {
    pub target: ModelKind,
    pub actions: &'a [String],
    pub configurations: Configurations,
    pub account_id: Uuid,
    pub project_id: Option<Uuid>,
}

impl DenialMessages<'_> {
    fn configurations_clause(&self) -> String {
        let rendered: Vec<String> = self
            .configurations
            .iter()
            .filter(|(_, types)| !types.is_empty())
            .map(|(kind, types)| {
                let types: Vec<String> = types.iter().map(|(n, v)| format!("{n}:{v}")).collect();
                format!("Resource - {kind}, Types - [{}]", types.join(", "))
            })
            .collect();
        if rendered.is_empty() {
            String::new()
        } else {
            format!("under the following configurations - ({}) - ", rendered.join("; "))
        }
    }

    fn action_clause(&self) -> String {
        format!(
            "the action sequence - '{}' - on '{}' resources {}",
            self.actions.join("."),
            self.target,
            self.configurations_clause()
        )
    }

    fn project(&self) -> String {
        self.project_id.map(|p| p.to_string()).unwrap_or_default()
    }

    pub fn account(&self) -> String {
        format!(
            "you do not have superadmin/account-admin privileges and you do not have account-specific role-based access permissions to perform {}in account - {}",
            self.action_clause(),
            self.account_id
        )
    }

    pub fn project_override(&self) -> String {
        format!(
            "you are denied permissions to perform {}due to project-specific permission overrides in project - '{}'",
            self.action_clause(),
            self.project()
        )
    }

    pub fn apikey(&self) -> String {
        format!(
            "you are denied permissions to perform {}due to apikey-specific permission overrides in project - '{}'",
            self.action_clause(),
            self.project()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untyped_account_message() {
        let account_id = Uuid::nil();
        let actions = vec!["TAG".to_string()];
        let messages = DenialMessages {
            target: ModelKind::Dataset,
            actions: &actions,
            configurations: vec![(ModelKind::Project, vec![]), (ModelKind::Dataset, vec![])],
            account_id,
            project_id: None,
        };
        assert_eq!(
            messages.account(),
            format!(
                "you do not have superadmin/account-admin privileges and you do not have account-specific role-based access permissions to perform the action sequence - 'TAG' - on 'Dataset' resources in account - {account_id}"
            )
        );
    }

    #[test]
    fn test_typed_project_message() {
        let project_id = Uuid::new_v4();
        let actions = vec!["CONFIGURATION".to_string(), "READ".to_string()];
        let messages = DenialMessages {
            target: ModelKind::Instance,
            actions: &actions,
            configurations: vec![
                (
                    ModelKind::Application,
                    vec![("applicationType".to_string(), "ingest".to_string())],
                ),
                (ModelKind::Instance, vec![]),
            ],
            account_id: Uuid::nil(),
            project_id: Some(project_id),
        };
        assert_eq!(
            messages.project_override(),
            format!(
                "you are denied permissions to perform the action sequence - 'CONFIGURATION.READ' - on 'Instance' resources under the following configurations - (Resource - Application, Types - [applicationType:ingest]) - due to project-specific permission overrides in project - '{project_id}'"
            )
        );
        assert!(messages.apikey().contains("apikey-specific permission overrides"));
    }
}
