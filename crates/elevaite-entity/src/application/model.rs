//! Application entity.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Type branch of an application. Permissions are granted per type value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "application_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ApplicationType {
    /// Data ingestion connectors.
    Ingest,
    /// Preprocessing pipelines.
    Preprocess,
}

impl ApplicationType {
    /// All application types, in permission-schema order.
    pub const ALL: [ApplicationType; 2] = [Self::Ingest, Self::Preprocess];

    /// Return the type as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ingest => "ingest",
            Self::Preprocess => "preprocess",
        }
    }
}

impl fmt::Display for ApplicationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ApplicationType {
    type Err = elevaite_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ingest" => Ok(Self::Ingest),
            "preprocess" => Ok(Self::Preprocess),
            _ => Err(elevaite_core::AppError::validation(format!(
                "Invalid application type: '{s}'. Expected one of: ingest, preprocess"
            ))),
        }
    }
}

/// A deployable application (connector or pipeline).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Application {
    /// Unique application identifier.
    pub id: Uuid,
    /// Display title.
    pub title: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Semantic version string.
    pub version: String,
    /// Type branch used for permission checks.
    #[serde(rename = "applicationType")]
    pub application_type: ApplicationType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_application_type_round_trip() {
        for ty in ApplicationType::ALL {
            assert_eq!(ty.as_str().parse::<ApplicationType>().unwrap(), ty);
        }
        assert!("Ingest".parse::<ApplicationType>().is_err());
    }
}
