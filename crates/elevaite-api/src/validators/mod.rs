//! Route validators.
//!
//! Each protected endpoint names a zero-sized rule type implementing
//! [`RouteRule`]. Taking [`Validated<R>`] as a handler argument runs the
//! rule before the handler body: authentication, scope resolution, the RBAC
//! permission walk and the rule's post-check, all inside one RBAC session.

pub mod rules;

use std::marker::PhantomData;

use axum::extract::rejection::RawPathParamsRejection;
use axum::extract::{FromRequestParts, RawPathParams};
use axum::http::HeaderMap;
use axum::http::request::Parts;
use tracing::debug;
use uuid::Uuid;

use elevaite_auth::{AuthenticatedEntity, RouteScope, ScopeContext, ValidationInfo};
use elevaite_core::{AppError, AppResult};
use elevaite_database::rbac::RbacStore;
use elevaite_entity::account::Account;
use elevaite_entity::apikey::Apikey;
use elevaite_entity::application::{Application, Configuration, Instance};
use elevaite_entity::dataset::Dataset;
use elevaite_entity::project::Project;
use elevaite_entity::user::User;
use elevaite_entity::{ModelKind, Resource};
use elevaite_service::RequestContext;

use crate::error::ApiError;
use crate::extractors::auth::{AuthType, authenticate};
use crate::session::RbacSession;
use crate::state::AppState;

/// What a rule checks once the principal is known.
#[derive(Debug, Clone, Copy)]
pub enum Check {
    /// A valid principal is enough.
    Authentication,
    /// The principal must belong to the scope; no permission leaf applies.
    Scope { target: ModelKind },
    /// The principal must hold `actions` on `target`.
    Permission {
        target: ModelKind,
        actions: &'static [&'static str],
    },
}

/// Authorization rule of one endpoint.
pub trait RouteRule: Send + Sync + 'static {
    /// Label for logs.
    const NAME: &'static str;
    const SCOPE: RouteScope;
    const AUTH: AuthType;
    const CHECK: Check;

    /// Extra condition evaluated after the RBAC check passed.
    fn post_check(_info: &ValidationInfo, _scope: &ScopeContext) -> AppResult<()> {
        Ok(())
    }
}

/// Proof that the request passed rule `R`.
#[derive(Debug)]
pub struct Validated<R> {
    pub info: ValidationInfo,
    pub scope: ScopeContext,
    rule: PhantomData<fn() -> R>,
}

impl<R: RouteRule> FromRequestParts<AppState> for Validated<R> {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let path_params = raw_path_params(parts, state).await?;

        let session = RbacSession::begin(state.rbac_store.as_ref()).await?;
        let result = validate::<R>(&parts.headers, &path_params, state, session.store()).await;
        let (info, scope) = session.finish(result).await?;

        Ok(Self {
            info,
            scope,
            rule: PhantomData,
        })
    }
}

async fn raw_path_params(
    parts: &mut Parts,
    state: &AppState,
) -> Result<Vec<(String, String)>, AppError> {
    match RawPathParams::from_request_parts(parts, state).await {
        Ok(params) => Ok(params
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()),
        Err(RawPathParamsRejection::InvalidUtf8InPathParam(rejection)) => {
            Err(AppError::validation(rejection.body_text()))
        }
        Err(_) => Ok(Vec::new()),
    }
}

async fn validate<R: RouteRule>(
    headers: &HeaderMap,
    path_params: &[(String, String)],
    state: &AppState,
    store: &dyn RbacStore,
) -> AppResult<(ValidationInfo, ScopeContext)> {
    let entity = authenticate(headers, state, store, R::AUTH).await?;

    let rbac = &state.config.rbac;
    let scope = ScopeContext::resolve(
        R::SCOPE,
        path_params
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str())),
        header_value(headers, &rbac.account_header),
        header_value(headers, &rbac.project_header),
    )?;

    let info = match R::CHECK {
        Check::Authentication => ValidationInfo::authenticated(entity),
        Check::Scope { target } => {
            state
                .validator
                .validate_scope(store, entity, &scope, target)
                .await?
        }
        Check::Permission { target, actions } => {
            let actions: Vec<String> = actions.iter().map(|a| a.to_string()).collect();
            state
                .validator
                .validate_rbac_permissions(store, entity, &scope, target, &actions)
                .await?
        }
    };
    R::post_check(&info, &scope)?;

    debug!(
        rule = R::NAME,
        entity = info.entity.kind(),
        entity_id = %info.entity.id(),
        "Route validation passed"
    );
    Ok((info, scope))
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn not_loaded(kind: ModelKind) -> AppError {
    AppError::internal(format!("{kind} was not loaded by route validation"))
}

impl<R> Validated<R> {
    /// Context handed to services.
    pub fn context(&self) -> RequestContext {
        RequestContext::from_validation(&self.info)
    }

    pub fn entity(&self) -> &AuthenticatedEntity {
        &self.info.entity
    }

    /// A `*_id` the request was scoped with.
    pub fn id(&self, name: &str) -> AppResult<Uuid> {
        self.scope
            .get(name)
            .ok_or_else(|| AppError::internal(format!("parameter '{name}' was not resolved")))
    }

    fn loaded<'a, T>(
        &'a self,
        kind: ModelKind,
        borrow: fn(&'a Resource) -> Option<&'a T>,
    ) -> AppResult<&'a T> {
        self.info
            .resource(kind)
            .and_then(borrow)
            .ok_or_else(|| not_loaded(kind))
    }

    pub fn account(&self) -> AppResult<&Account> {
        self.loaded(ModelKind::Account, Resource::as_account)
    }

    pub fn project(&self) -> AppResult<&Project> {
        self.loaded(ModelKind::Project, Resource::as_project)
    }

    /// The user named by the path, not the principal.
    pub fn user(&self) -> AppResult<&User> {
        self.loaded(ModelKind::User, Resource::as_user)
    }

    pub fn apikey(&self) -> AppResult<&Apikey> {
        self.loaded(ModelKind::Apikey, Resource::as_apikey)
    }

    pub fn dataset(&self) -> AppResult<&Dataset> {
        self.loaded(ModelKind::Dataset, Resource::as_dataset)
    }

    pub fn application(&self) -> AppResult<&Application> {
        self.loaded(ModelKind::Application, Resource::as_application)
    }

    pub fn configuration(&self) -> AppResult<&Configuration> {
        self.loaded(ModelKind::Configuration, Resource::as_configuration)
    }

    pub fn instance(&self) -> AppResult<&Instance> {
        self.loaded(ModelKind::Instance, Resource::as_instance)
    }
}
