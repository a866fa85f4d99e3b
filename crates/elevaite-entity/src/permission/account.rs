//! Account-scoped permission tree, stored on roles.

use super::macros::permission_node;
use super::marker::Allow;

permission_node! {
    /// Dataset actions inside a project.
    pub struct DatasetPermission [at_least_one] {
        optional: { ACTION_READ: Allow, ACTION_TAG: Allow }
        required: {}
    }
}

permission_node! {
    /// Collection actions inside a project.
    pub struct CollectionPermission [at_least_one] {
        optional: { ACTION_CREATE: Allow, ACTION_READ: Allow }
        required: {}
    }
}

permission_node! {
    /// API key management inside a project.
    pub struct ApikeyPermission [at_least_one] {
        optional: { ACTION_READ: Allow, ACTION_CREATE: Allow }
        required: {}
    }
}

permission_node! {
    pub struct ServicenowTicketIngestPermission [lenient] {
        optional: {}
        required: { ACTION_INGEST: Allow }
    }
}

permission_node! {
    /// `ACTION_SERVICENOW.ACTION_TICKET.ACTION_INGEST`
    pub struct ServicenowTicketPermission [lenient] {
        optional: {}
        required: { ACTION_TICKET: ServicenowTicketIngestPermission }
    }
}

permission_node! {
    pub struct ProjectPermission [at_least_one] {
        optional: {
            ACTION_CREATE: Allow,
            ACTION_READ: Allow,
            ACTION_SERVICENOW: ServicenowTicketPermission,
            ENTITY_Dataset: DatasetPermission,
            ENTITY_Collection: CollectionPermission,
            ENTITY_Apikey: ApikeyPermission,
        }
        required: {}
    }
}

permission_node! {
    /// Configuration actions under one application type.
    pub struct ConfigurationPermission [at_least_one] {
        optional: { ACTION_READ: Allow, ACTION_CREATE: Allow, ACTION_UPDATE: Allow }
        required: {}
    }
}

permission_node! {
    pub struct InstanceConfigurationPermission [lenient] {
        optional: {}
        required: { ACTION_READ: Allow }
    }
}

permission_node! {
    /// Instance actions under one application type.
    pub struct InstancePermission [at_least_one] {
        optional: {
            ACTION_READ: Allow,
            ACTION_CREATE: Allow,
            ACTION_CONFIGURATION: InstanceConfigurationPermission,
        }
        required: {}
    }
}

permission_node! {
    /// Grants under a single `TYPEVALUES_` branch of an application.
    pub struct ApplicationTypePermission [at_least_one] {
        optional: {
            ENTITY_Configuration: ConfigurationPermission,
            ENTITY_Instance: InstancePermission,
            ACTION_READ: Allow,
        }
        required: {}
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
    /// Root of a role's permissions.
    pub struct AccountScopedRbacPermission [lenient] {
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
    use crate::permission::{PermissionNode, PermissionSchemaError, parse_permissions};
    use serde_json::json;

    #[test]
    fn test_create_populates_every_leaf() {
        let tree = serde_json::to_value(AccountScopedRbacPermission::create()).unwrap();
        assert_eq!(tree["ENTITY_Project"]["ACTION_READ"], "Allow");
        assert_eq!(
            tree["ENTITY_Project"]["ACTION_SERVICENOW"]["ACTION_TICKET"]["ACTION_INGEST"],
            "Allow"
        );
        assert_eq!(
            tree["ENTITY_Application"]["TYPENAMES_applicationType"]["TYPEVALUES_preprocess"]
                ["ENTITY_Instance"]["ACTION_CONFIGURATION"]["ACTION_READ"],
            "Allow"
        );
    }

    #[test]
    fn test_all_null_node_is_rejected() {
        let err = parse_permissions::<AccountScopedRbacPermission>(&json!({
            "ENTITY_Project": { "ENTITY_Dataset": { "ACTION_READ": null, "ACTION_TAG": null } }
        }))
        .unwrap_err();
        assert_eq!(
            err,
            PermissionSchemaError::EmptyNode {
                path: "ENTITY_Project.ENTITY_Dataset".to_string(),
                fields: "'ACTION_READ', 'ACTION_TAG'".to_string(),
            }
        );
        assert!(err.to_string().contains("At least one field from - 'ACTION_READ', 'ACTION_TAG' must be provided"));
    }

    #[test]
    fn test_empty_root_is_accepted() {
        let parsed = parse_permissions::<AccountScopedRbacPermission>(&json!({})).unwrap();
        assert!(parsed.ENTITY_Project.is_none());
        assert!(parsed.ENTITY_Application.is_none());
    }

    #[test]
    fn test_unknown_key_and_wrong_marker_are_rejected() {
        assert!(matches!(
            parse_permissions::<AccountScopedRbacPermission>(&json!({
                "ENTITY_Project": { "ACTION_DELETE": "Allow" }
            })),
            Err(PermissionSchemaError::Malformed(_))
        ));
        assert!(matches!(
            parse_permissions::<AccountScopedRbacPermission>(&json!({
                "ENTITY_Project": { "ACTION_READ": "Deny" }
            })),
            Err(PermissionSchemaError::Malformed(_))
        ));
    }

    #[test]
    fn test_required_field_must_be_present() {
        assert!(parse_permissions::<AccountScopedRbacPermission>(&json!({
            "ENTITY_Application": {}
        }))
        .is_err());
        assert!(parse_permissions::<AccountScopedRbacPermission>(&json!({
            "ENTITY_Project": { "ACTION_SERVICENOW": { "ACTION_TICKET": {} } }
        }))
        .is_err());
    }

    #[test]
    fn test_validate_full_tree() {
        assert!(AccountScopedRbacPermission::create().validate().is_ok());
    }
}
