//! Project-scoped permission tree, stored as user-project overrides.
//!
//! Only `"Deny"` markers are allowed; an override narrows what the user's
//! account roles grant inside one project.

use super::macros::permission_node;
use super::marker::Deny;

permission_node! {
    pub struct DatasetPermission [at_least_one] {
        optional: { ACTION_READ: Deny, ACTION_TAG: Deny }
        required: {}
    }
}

permission_node! {
    pub struct CollectionPermission [at_least_one] {
        optional: { ACTION_CREATE: Deny, ACTION_READ: Deny }
        required: {}
    }
}

permission_node! {
    pub struct ApikeyPermission [at_least_one] {
        optional: { ACTION_READ: Deny, ACTION_CREATE: Deny }
        required: {}
    }
}

permission_node! {
    pub struct ServicenowTicketIngestPermission [lenient] {
        optional: {}
        required: { ACTION_INGEST: Deny }
    }
}

permission_node! {
    pub struct ServicenowTicketPermission [lenient] {
        optional: {}
        required: { ACTION_TICKET: ServicenowTicketIngestPermission }
    }
}

permission_node! {
    /// Project reads cannot be overridden; only account roles decide them.
    pub struct ProjectPermission [at_least_one] {
        optional: {
            ACTION_CREATE: Deny,
            ACTION_SERVICENOW: ServicenowTicketPermission,
            ENTITY_Dataset: DatasetPermission,
            ENTITY_Collection: CollectionPermission,
            ENTITY_Apikey: ApikeyPermission,
        }
        required: {}
    }
}

permission_node! {
    pub struct InstanceConfigurationPermission [lenient] {
        optional: {}
        required: { ACTION_READ: Deny }
    }
}

permission_node! {
    pub struct InstancePermission [at_least_one] {
        optional: {
            ACTION_READ: Deny,
            ACTION_CREATE: Deny,
            ACTION_CONFIGURATION: InstanceConfigurationPermission,
        }
        required: {}
    }
}

permission_node! {
    /// Instances are the only project-bound resource under an application.
    pub struct ApplicationTypePermission [lenient] {
        optional: {}
        required: { ENTITY_Instance: InstancePermission }
    }
}

permission_node! {
    pub struct ApplicationTypeValues [at_least_one] {
        optional: {
            TYPEVALUES_ingest: ApplicationTypePermission,
            TYPEVALUES_preprocess: ApplicationTypePermission,
        }
        required: {}
    }
}

permission_node! {
    pub struct ApplicationTypeNames [lenient] {
        optional: {}
        required: { TYPENAMES_applicationType: ApplicationTypeValues }
    }
}

permission_node! {
    /// Root of a user's overrides in one project.
    pub struct ProjectScopedRbacPermission [lenient] {
        optional: {
            ENTITY_Project: ProjectPermission,
            ENTITY_Application: ApplicationTypeNames,
        }
        required: {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permission::{PermissionNode, parse_permissions};
    use serde_json::json;

    #[test]
    fn test_overrides_only_accept_deny() {
        assert!(parse_permissions::<ProjectScopedRbacPermission>(&json!({
            "ENTITY_Project": { "ENTITY_Dataset": { "ACTION_TAG": "Deny" } }
        }))
        .is_ok());
        assert!(parse_permissions::<ProjectScopedRbacPermission>(&json!({
            "ENTITY_Project": { "ENTITY_Dataset": { "ACTION_TAG": "Allow" } }
        }))
        .is_err());
    }

    #[test]
    fn test_project_read_is_not_overridable() {
        assert!(parse_permissions::<ProjectScopedRbacPermission>(&json!({
            "ENTITY_Project": { "ACTION_READ": "Deny" }
        }))
        .is_err());
    }

    #[test]
    fn test_application_branch_requires_instance() {
        assert!(parse_permissions::<ProjectScopedRbacPermission>(&json!({
            "ENTITY_Application": { "TYPENAMES_applicationType": { "TYPEVALUES_ingest": {} } }
        }))
        .is_err());
        let full = serde_json::to_value(ProjectScopedRbacPermission::create()).unwrap();
        assert!(full["ENTITY_Application"]["TYPENAMES_applicationType"]["TYPEVALUES_ingest"]
            .get("ENTITY_Configuration")
            .is_none());
    }
}
