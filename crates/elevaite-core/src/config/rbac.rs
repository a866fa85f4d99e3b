//! RBAC request-scoping configuration.

use serde::{Deserialize, Serialize};

/// Header names carrying the account/project scope and API key of a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RbacConfig {
    /// Header naming the account a request is scoped to.
    #[serde(default = "default_account_header")]
    pub account_header: String,
    /// Header naming the project a request is scoped to.
    #[serde(default = "default_project_header")]
    pub project_header: String,
    /// Header carrying an API key.
    #[serde(default = "default_apikey_header")]
    pub apikey_header: String,
}

impl Default for RbacConfig {
    fn default() -> Self {
        Self {
            account_header: default_account_header(),
            project_header: default_project_header(),
            apikey_header: default_apikey_header(),
        }
    }
}

fn default_account_header() -> String {
    "X-elevAIte-AccountId".to_string()
}

fn default_project_header() -> String {
    "X-elevAIte-ProjectId".to_string()
}

fn default_apikey_header() -> String {
    "X-elevAIte-apikey".to_string()
}
