//! The principal a request is authenticated as.

use serde::Serialize;
use uuid::Uuid;

use elevaite_entity::apikey::Apikey;
use elevaite_entity::user::User;

/// A user (access token) or an API key.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "entity", rename_all = "snake_case")]
pub enum AuthenticatedEntity {
    User(User),
    Apikey(Apikey),
}

impl AuthenticatedEntity {
    pub fn id(&self) -> Uuid {
        match self {
            Self::User(u) => u.id,
            Self::Apikey(k) => k.id,
        }
    }

    pub fn as_user(&self) -> Option<&User> {
        match self {
            Self::User(u) => Some(u),
            Self::Apikey(_) => None,
        }
    }

    pub fn as_apikey(&self) -> Option<&Apikey> {
        match self {
            Self::Apikey(k) => Some(k),
            Self::User(_) => None,
        }
    }

    /// Only users can be superadmins.
    pub fn is_superadmin(&self) -> bool {
        self.as_user().is_some_and(|u| u.is_superadmin)
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::User(_) => "user",
            Self::Apikey(_) => "apikey",
        }
    }
}
