//! Which ids a request is scoped to.
//!
//! Every protected endpoint declares a [`RouteScope`]. The account and
//! project headers only count when the endpoint has that context and the
//! path does not already pin it.

use std::collections::BTreeMap;

use uuid::Uuid;

use elevaite_core::AppError;

/// Account/project context an endpoint runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RouteScope {
    pub account: bool,
    pub project: bool,
}

impl RouteScope {
    pub const NONE: Self = Self {
        account: false,
        project: false,
    };
    pub const ACCOUNT: Self = Self {
        account: true,
        project: false,
    };
    pub const PROJECT: Self = Self {
        account: false,
        project: true,
    };
    pub const ACCOUNT_AND_PROJECT: Self = Self {
        account: true,
        project: true,
    };
}

/// Resolved `*_id` params of one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeContext {
    params: BTreeMap<String, Uuid>,
}

impl ScopeContext {
    /// Combine path params with the scope headers.
    ///
    /// `path_params` holds raw path segments by name; params not ending in
    /// `_id` are ignored. Ids that are not UUIDs are rejected with 422.
    pub fn resolve<'a>(
        scope: RouteScope,
        path_params: impl IntoIterator<Item = (&'a str, &'a str)>,
        account_header: Option<&str>,
        project_header: Option<&str>,
    ) -> Result<Self, AppError> {
        let mut params = BTreeMap::new();
        for (name, raw) in path_params {
            if name.ends_with("_id") {
                params.insert(name.to_string(), parse_id(name, raw)?);
            }
        }

        let path_has_account = params.contains_key("account_id");
        let path_has_project = params.contains_key("project_id");

        if scope.account && !path_has_account && !path_has_project {
            if let Some(raw) = account_header {
                params.insert("account_id".to_string(), parse_id("account_id", raw)?);
            }
        }
        if scope.project && !path_has_project {
            if let Some(raw) = project_header {
                params.insert("project_id".to_string(), parse_id("project_id", raw)?);
            }
        }

        Ok(Self { params })
    }

    /// Context from already-parsed params.
    pub fn from_params(params: BTreeMap<String, Uuid>) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &BTreeMap<String, Uuid> {
        &self.params
    }

    pub fn get(&self, name: &str) -> Option<Uuid> {
        self.params.get(name).copied()
    }

    pub fn account_id(&self) -> Option<Uuid> {
        self.get("account_id")
    }

    pub fn project_id(&self) -> Option<Uuid> {
        self.get("project_id")
    }
}

fn parse_id(name: &str, raw: &str) -> Result<Uuid, AppError> {
    Uuid::try_parse(raw.trim())
        .map_err(|_| AppError::validation(format!("{name} - '{raw}' - is not a valid UUID")))
}
