//! Issuing, listing and revoking project API keys.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};
use uuid::Uuid;

use elevaite_auth::ApikeySecret;
use elevaite_core::error::AppError;
use elevaite_database::repositories::{ApikeyRepository, RoleRepository};
use elevaite_entity::apikey::{Apikey, ApikeyPermissionsType, CreateApikey};
use elevaite_entity::permission::{
    ApikeyScopedRbacPermission, RbacPermissionScope, full_tree, map_to_apikey_scoped_permissions,
    parse_permissions,
};
use elevaite_entity::role::Role;

use super::permissions::{clone_permissions, within_grants};
use crate::context::{MessageResponse, RequestContext};

/// Handles API key lifecycle within a project.
#[derive(Debug, Clone)]
pub struct ApikeyService {
    apikeys: Arc<ApikeyRepository>,
    roles: Arc<RoleRepository>,
    max_lifetime: Duration,
}

/// Body of an API key creation request.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateApikeyRequest {
    pub name: String,
    pub permissions_type: ApikeyPermissionsType,
    /// Only read for `custom` keys; defaults to no permissions.
    pub permissions: Option<Value>,
    /// Defaults to the longest allowed lifetime.
    pub expires_at: Option<DateTime<Utc>>,
}

/// A new key together with its plaintext, shown only once.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedApikey {
    #[serde(flatten)]
    pub apikey: Apikey,
    pub key: String,
}

impl ApikeyService {
    pub fn new(
        apikeys: Arc<ApikeyRepository>,
        roles: Arc<RoleRepository>,
        max_lifetime_days: i64,
    ) -> Self {
        Self {
            apikeys,
            roles,
            max_lifetime: Duration::days(max_lifetime_days),
        }
    }

    /// Issues a key bound to `project_id`.
    ///
    /// Cloned keys receive the creator's effective permissions in the
    /// project. Custom keys receive the validated request permissions,
    /// which must stay within the creator's own unless they manage the
    /// project.
    pub async fn create_apikey(
        &self,
        ctx: &RequestContext,
        project_id: Uuid,
        req: CreateApikeyRequest,
    ) -> Result<CreatedApikey, AppError> {
        let creator = ctx.require_user()?;
        let expires_at = resolve_expiry(ctx.request_time, req.expires_at, self.max_lifetime)?;

        let permissions = match req.permissions_type {
            ApikeyPermissionsType::Custom => {
                let permissions = req.permissions.unwrap_or_else(|| Value::Object(Default::default()));
                let parsed = parse_permissions::<ApikeyScopedRbacPermission>(&permissions)?;
                let permissions = serde_json::to_value(&parsed)?;
                if !ctx.manages_project() {
                    let (roles, ceiling) = self.creator_grants(ctx).await?;
                    ensure_within_grants(project_id, &permissions, &roles, ceiling.as_ref())?;
                }
                permissions
            }
            ApikeyPermissionsType::Cloned => self.cloned_permissions(ctx).await?,
        };

        let generated = ApikeySecret::generate(Uuid::now_v7())?;
        let apikey = self
            .apikeys
            .create(&CreateApikey {
                id: generated.id,
                name: req.name,
                creator_id: creator.id,
                project_id,
                permissions_type: req.permissions_type,
                key_hash: generated.key_hash,
                permissions,
                expires_at,
            })
            .await?;

        info!(
            apikey_id = %apikey.id,
            project_id = %project_id,
            creator_id = %creator.id,
            permissions_type = apikey.permissions_type.as_str(),
            "API key created"
        );
        Ok(CreatedApikey {
            apikey,
            key: generated.plaintext,
        })
    }

    /// Keys of a project. Regular members only see keys they created.
    pub async fn list_apikeys(
        &self,
        ctx: &RequestContext,
        project_id: Uuid,
    ) -> Result<Vec<Apikey>, AppError> {
        let apikeys = self.apikeys.find_by_project(project_id).await?;
        Ok(apikeys
            .into_iter()
            .filter(|apikey| ensure_visible(ctx, apikey).is_ok())
            .collect())
    }

    /// One key of a project. Regular members may only read keys they created.
    pub fn get_apikey(&self, ctx: &RequestContext, apikey: &Apikey) -> Result<Apikey, AppError> {
        ensure_visible(ctx, apikey)?;
        Ok(apikey.clone())
    }

    /// Revokes a key. Regular members may only revoke keys they created.
    pub async fn delete_apikey(
        &self,
        ctx: &RequestContext,
        apikey: &Apikey,
    ) -> Result<MessageResponse, AppError> {
        if !ctx.manages_project() && apikey.creator_id != ctx.actor_id() {
            return Err(AppError::authorization(format!(
                "you do not have permissions to revoke apikey - '{}' - created by another user",
                apikey.id
            )));
        }
        if !self.apikeys.delete(apikey.id, apikey.project_id).await? {
            return Err(AppError::not_found(format!(
                "Apikey - '{}' - not found",
                apikey.id
            )));
        }

        info!(apikey_id = %apikey.id, project_id = %apikey.project_id, "API key revoked");
        Ok(MessageResponse::new(format!(
            "Successfully revoked apikey - '{}'",
            apikey.id
        )))
    }

    async fn cloned_permissions(&self, ctx: &RequestContext) -> Result<Value, AppError> {
        let full = full_tree::<ApikeyScopedRbacPermission>();
        if ctx.manages_project() {
            return Ok(full);
        }

        let (roles, ceiling) = self.creator_grants(ctx).await?;
        Ok(clone_permissions(&full, &roles, ceiling.as_ref()))
    }

    /// The creator's account roles and the apikey-scoped ceiling their
    /// project overrides leave.
    async fn creator_grants(
        &self,
        ctx: &RequestContext,
    ) -> Result<(Vec<Role>, Option<Value>), AppError> {
        let roles = match &ctx.user_account {
            Some(membership) => self.roles.find_by_user_account(membership.id).await?,
            None => Vec::new(),
        };
        let ceiling = match &ctx.user_project {
            Some(membership) => Some(
                map_to_apikey_scoped_permissions(
                    membership.permission_overrides.clone(),
                    RbacPermissionScope::Project,
                )
                .map_err(|e| {
                    error!(
                        user_id = %membership.user_id,
                        project_id = %membership.project_id,
                        error = %e,
                        "Stored permission overrides are malformed"
                    );
                    AppError::service_unavailable()
                })?,
            ),
            None => None,
        };
        Ok((roles, ceiling))
    }
}

/// Regular members may only see keys they created.
fn ensure_visible(ctx: &RequestContext, apikey: &Apikey) -> Result<(), AppError> {
    if !ctx.manages_project() && apikey.creator_id != ctx.actor_id() {
        return Err(AppError::authorization(format!(
            "you do not have permissions to read apikey - '{}' - created by another user",
            apikey.id
        )));
    }
    Ok(())
}

/// Custom permissions may not exceed what the creator holds in the project.
fn ensure_within_grants(
    project_id: Uuid,
    requested: &Value,
    roles: &[Role],
    ceiling: Option<&Value>,
) -> Result<(), AppError> {
    if within_grants(requested, roles, ceiling) {
        return Ok(());
    }
    Err(AppError::authorization(format!(
        "you cannot grant an apikey permissions you do not hold in project - '{project_id}'"
    )))
}

/// Expiry of a new key: the requested time, bounded by `max_lifetime`.
fn resolve_expiry(
    now: DateTime<Utc>,
    requested: Option<DateTime<Utc>>,
    max_lifetime: Duration,
) -> Result<DateTime<Utc>, AppError> {
    let latest = now + max_lifetime;
    match requested {
        None => Ok(latest),
        Some(at) if at <= now => Err(AppError::validation("expires_at must be in the future")),
        Some(at) if at > latest => Err(AppError::validation(format!(
            "expires_at must be within {} days from now",
            max_lifetime.num_days()
        ))),
        Some(at) => Ok(at),
    }
}
