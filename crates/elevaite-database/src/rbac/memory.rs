//! In-memory RBAC store for tests.
//!
//! Sessions share one immutable dataset and record how they ended, so
//! tests can assert commit/rollback behaviour without a database.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use uuid::Uuid;

use elevaite_core::{AppError, AppResult};
use elevaite_entity::association::{UserAccount, UserProject};
use elevaite_entity::role::Role;
use elevaite_entity::{ModelKind, Resource};

use super::{RbacStore, RbacStoreProvider, value_at_path};

/// Rows visible to in-memory sessions.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRbacData {
    resources: HashMap<(ModelKind, Uuid), Resource>,
    user_accounts: Vec<UserAccount>,
    user_projects: Vec<UserProject>,
    roles: HashMap<Uuid, Role>,
    role_assignments: Vec<(Uuid, Uuid)>,
}

impl InMemoryRbacData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add any row.
    pub fn insert(&mut self, resource: Resource) -> &mut Self {
        self.resources
            .insert((resource.kind(), resource.id()), resource);
        self
    }

    /// Add an account membership.
    pub fn insert_user_account(&mut self, association: UserAccount) -> &mut Self {
        self.user_accounts.push(association);
        self
    }

    /// Add a project membership.
    pub fn insert_user_project(&mut self, association: UserProject) -> &mut Self {
        self.user_projects.push(association);
        self
    }

    /// Add a role and assign it to an account membership.
    pub fn assign_role(&mut self, role: Role, user_account_id: Uuid) -> &mut Self {
        self.role_assignments.push((role.id, user_account_id));
        self.roles.insert(role.id, role);
        self
    }

    fn parent_of(&self, project_id: Uuid) -> Option<Uuid> {
        match self.resources.get(&(ModelKind::Project, project_id)) {
            Some(Resource::Project(p)) => p.parent_project_id,
            _ => None,
        }
    }
}

/// Counters shared by all sessions of one provider.
#[derive(Debug, Default)]
pub struct SessionStats {
    pub begun: AtomicUsize,
    pub commits: AtomicUsize,
    pub rollbacks: AtomicUsize,
}

impl SessionStats {
    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    pub fn rollbacks(&self) -> usize {
        self.rollbacks.load(Ordering::SeqCst)
    }
}

/// Provider handing out [`InMemoryRbacStore`] sessions.
#[derive(Debug, Clone)]
pub struct InMemoryRbacStoreProvider {
    data: Arc<InMemoryRbacData>,
    stats: Arc<SessionStats>,
    fail_reads: Arc<AtomicBool>,
}

impl InMemoryRbacStoreProvider {
    pub fn new(data: InMemoryRbacData) -> Self {
        Self {
            data: Arc::new(data),
            stats: Arc::new(SessionStats::default()),
            fail_reads: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make every subsequent read fail with a database error.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn stats(&self) -> Arc<SessionStats> {
        Arc::clone(&self.stats)
    }

    /// A session outside of any provider bookkeeping.
    pub fn session(&self) -> InMemoryRbacStore {
        InMemoryRbacStore {
            data: Arc::clone(&self.data),
            stats: Arc::clone(&self.stats),
            fail_reads: Arc::clone(&self.fail_reads),
            closed: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl RbacStoreProvider for InMemoryRbacStoreProvider {
    async fn begin(&self) -> AppResult<Box<dyn RbacStore>> {
        self.stats.begun.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(self.session()))
    }
}

/// One in-memory session.
#[derive(Debug)]
pub struct InMemoryRbacStore {
    data: Arc<InMemoryRbacData>,
    stats: Arc<SessionStats>,
    fail_reads: Arc<AtomicBool>,
    closed: AtomicBool,
}

impl InMemoryRbacStore {
    fn check_read(&self) -> AppResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AppError::database("connection reset by peer"));
        }
        if self.closed.load(Ordering::SeqCst) {
            return Err(AppError::internal("RBAC session is already closed"));
        }
        Ok(())
    }

    fn close(&self) -> AppResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(AppError::internal("RBAC session is already closed"));
        }
        Ok(())
    }
}

#[async_trait]
impl RbacStore for InMemoryRbacStore {
    async fn find_resource(&self, kind: ModelKind, id: Uuid) -> AppResult<Option<Resource>> {
        self.check_read()?;
        Ok(self.data.resources.get(&(kind, id)).cloned())
    }

    async fn find_user_account(
        &self,
        user_id: Uuid,
        account_id: Uuid,
    ) -> AppResult<Option<UserAccount>> {
        self.check_read()?;
        Ok(self
            .data
            .user_accounts
            .iter()
            .find(|a| a.user_id == user_id && a.account_id == account_id)
            .cloned())
    }

    async fn find_user_project(
        &self,
        user_id: Uuid,
        project_id: Uuid,
    ) -> AppResult<Option<UserProject>> {
        self.check_read()?;
        Ok(self
            .data
            .user_projects
            .iter()
            .find(|a| a.user_id == user_id && a.project_id == project_id)
            .cloned())
    }

    async fn is_assigned_to_project_chain(
        &self,
        user_id: Uuid,
        project_id: Uuid,
    ) -> AppResult<bool> {
        self.check_read()?;
        let mut current = Some(project_id);
        while let Some(id) = current {
            let assigned = self
                .data
                .user_projects
                .iter()
                .any(|a| a.user_id == user_id && a.project_id == id);
            if !assigned {
                return Ok(false);
            }
            current = self.data.parent_of(id);
        }
        Ok(true)
    }

    async fn role_allows(&self, user_account_id: Uuid, path: &[String]) -> AppResult<bool> {
        self.check_read()?;
        Ok(self
            .data
            .role_assignments
            .iter()
            .filter(|(_, ua)| *ua == user_account_id)
            .filter_map(|(role_id, _)| self.data.roles.get(role_id))
            .any(|role| {
                value_at_path(&role.permissions, path).and_then(|v| v.as_str()) == Some("Allow")
            }))
    }

    async fn commit(&self) -> AppResult<()> {
        self.close()?;
        self.stats.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(&self) -> AppResult<()> {
        self.close()?;
        self.stats.rollbacks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
