//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Access token and API key configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for JWT signing (HMAC-SHA256).
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Access token TTL in minutes.
    #[serde(default = "default_access_ttl")]
    pub jwt_access_ttl_minutes: u64,
    /// Expected `iss` claim.
    #[serde(default = "default_issuer")]
    pub jwt_issuer: String,
    /// Upper bound on an API key's lifetime in days.
    #[serde(default = "default_apikey_max_lifetime")]
    pub apikey_max_lifetime_days: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            jwt_access_ttl_minutes: default_access_ttl(),
            jwt_issuer: default_issuer(),
            apikey_max_lifetime_days: default_apikey_max_lifetime(),
        }
    }
}

fn default_jwt_secret() -> String {
    "CHANGE_ME_IN_PRODUCTION".to_string()
}

fn default_access_ttl() -> u64 {
    60
}

fn default_issuer() -> String {
    "elevaite".to_string()
}

fn default_apikey_max_lifetime() -> i64 {
    365
}
