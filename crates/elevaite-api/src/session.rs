//! Request-scoped RBAC session.
//!
//! Every authorization runs in its own [`RbacStore`] session. The session
//! is committed when the work succeeds and rolled back exactly once when it
//! fails; failures that are not meant for the client leave as the generic
//! service-unavailable error.

use tracing::{error, warn};

use elevaite_core::{AppError, AppResult};
use elevaite_database::rbac::{RbacStore, RbacStoreProvider};

/// An open session over the RBAC store.
pub struct RbacSession {
    store: Box<dyn RbacStore>,
}

impl RbacSession {
    /// Open a session. A provider failure is reported as unavailable.
    pub async fn begin(provider: &dyn RbacStoreProvider) -> AppResult<Self> {
        match provider.begin().await {
            Ok(store) => Ok(Self { store }),
            Err(err) => Err(translate(err)),
        }
    }

    pub fn store(&self) -> &dyn RbacStore {
        self.store.as_ref()
    }

    /// Close the session according to `result`.
    pub async fn finish<T>(self, result: AppResult<T>) -> AppResult<T> {
        match result {
            Ok(value) => match self.store.commit().await {
                Ok(()) => Ok(value),
                Err(err) => Err(translate(err)),
            },
            Err(err) => {
                if let Err(rollback_err) = self.store.rollback().await {
                    warn!(error = %rollback_err, "RBAC session rollback failed");
                }
                Err(translate(err))
            }
        }
    }
}

impl std::fmt::Debug for RbacSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RbacSession").finish_non_exhaustive()
    }
}

/// Client-facing errors pass through; everything else becomes a 503.
pub fn translate(err: AppError) -> AppError {
    if err.kind.is_client_facing() {
        return err;
    }
    error!(
        kind = %err.kind,
        error = %err.message,
        source = ?err.source,
        "Authorization failed on server state"
    );
    AppError::service_unavailable()
}
