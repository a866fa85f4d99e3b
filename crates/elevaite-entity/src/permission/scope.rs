//! Permission scopes.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::marker::{Allow, Deny};

/// The three permission scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RbacPermissionScope {
    #[serde(rename = "ACCOUNT_SCOPE")]
    Account,
    #[serde(rename = "PROJECT_SCOPE")]
    Project,
    #[serde(rename = "APIKEY_SCOPE")]
    Apikey,
}

impl RbacPermissionScope {
    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Account => "ACCOUNT_SCOPE",
            Self::Project => "PROJECT_SCOPE",
            Self::Apikey => "APIKEY_SCOPE",
        }
    }

    /// Leaf literal stored by trees of this scope.
    pub fn marker(&self) -> &'static str {
        match self {
            Self::Account | Self::Apikey => Allow::LITERAL,
            Self::Project => Deny::LITERAL,
        }
    }
}

impl fmt::Display for RbacPermissionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
