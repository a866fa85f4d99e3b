//! Leaf markers.

use serde::{Deserialize, Serialize};

use super::{PermissionNode, PermissionSchemaError};

/// Grant marker used by account-scoped and apikey-scoped trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Allow {
    Allow,
}

/// Override marker used by project-scoped trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Deny {
    Deny,
}

impl Allow {
    pub const LITERAL: &'static str = "Allow";
}

impl Deny {
    pub const LITERAL: &'static str = "Deny";
}

impl PermissionNode for Allow {
    fn create() -> Self {
        Allow::Allow
    }

    fn validate_at(&self, _path: &mut Vec<&'static str>) -> Result<(), PermissionSchemaError> {
        Ok(())
    }
}

impl PermissionNode for Deny {
    fn create() -> Self {
        Deny::Deny
    }

    fn validate_at(&self, _path: &mut Vec<&'static str>) -> Result<(), PermissionSchemaError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markers_serialize_as_literals() {
        assert_eq!(serde_json::to_value(Allow::Allow).unwrap(), "Allow");
        assert_eq!(serde_json::to_value(Deny::Deny).unwrap(), "Deny");
        assert!(serde_json::from_value::<Allow>(serde_json::json!("Deny")).is_err());
        assert!(serde_json::from_value::<Deny>(serde_json::json!(true)).is_err());
    }
}
