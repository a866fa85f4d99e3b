//! Apikey-scoped permission tree, stored on API keys.
//!
//! Keys are bound to one project, so the tree only covers resources that
//! live inside a project. Leaves reuse the account-scope `"Allow"` nodes.

use super::account;
use super::macros::permission_node;

permission_node! {
    pub struct ProjectPermission [at_least_one] {
        optional: {
            ACTION_SERVICENOW: account::ServicenowTicketPermission,
            ENTITY_Dataset: account::DatasetPermission,
            ENTITY_Collection: account::CollectionPermission,
        }
        required: {}
    }
}

permission_node! {
    pub struct ApplicationTypePermission [lenient] {
        optional: {}
        required: { ENTITY_Instance: account::InstancePermission }
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
    /// Root of an API key's permissions.
    pub struct ApikeyScopedRbacPermission [lenient] {
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
    fn test_apikey_tree_has_no_create_or_apikey_management() {
        let full = serde_json::to_value(ApikeyScopedRbacPermission::create()).unwrap();
        let project = full["ENTITY_Project"].as_object().unwrap();
        assert!(!project.contains_key("ACTION_CREATE"));
        assert!(!project.contains_key("ENTITY_Apikey"));
        assert!(!project.contains_key("ACTION_READ"));
    }

    #[test]
    fn test_apikey_rejects_project_create() {
        assert!(parse_permissions::<ApikeyScopedRbacPermission>(&json!({
            "ENTITY_Project": { "ACTION_CREATE": "Allow" }
        }))
        .is_err());
    }
}
