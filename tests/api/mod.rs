//! API integration tests infrastructure
//!
//! In-memory repository implementations and fixtures shared by the HTTP
//! handler tests.

pub mod http;

use async_trait::async_trait;
use chrono::Utc;
use flock_core::domain::{
    Role, Tenant, TenantActivity, TenantId, TenantStatus, User, UserId, UserStatus,
};
use flock_core::error::{AppError, Result};
use flock_core::repository::{ActivityRepository, TenantRepository, UserRepository};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

// ============================================================================
// Fixtures
// ============================================================================

pub fn create_test_user(id: &str, role: Role, tenant_id: Option<&str>) -> User {
    User {
        id: UserId::from(id),
        email: format!("{}@flock.test", id),
        display_name: Some(id.to_string()),
        role,
        tenant_id: tenant_id.map(TenantId::from),
        ..Default::default()
    }
}

pub fn create_test_tenant(id: &str) -> Tenant {
    Tenant {
        id: TenantId::from(id),
        name: format!("Church {}", id),
        slug: id.to_string(),
        ..Default::default()
    }
}

pub fn create_test_activity(started: u64, completed: u64, posts: u64) -> TenantActivity {
    TenantActivity {
        assessments_started: started,
        assessments_completed: completed,
        posts,
        last_activity_at: None,
    }
}

// ============================================================================
// Test Repository Implementations
// ============================================================================

/// Configurable test user repository
pub struct TestUserRepository {
    users: RwLock<Vec<User>>,
}

impl TestUserRepository {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(vec![]),
        }
    }

    pub async fn add_user(&self, user: User) {
        self.users.write().await.push(user);
    }

    pub async fn find(&self, id: &str) -> Option<User> {
        self.users
            .read()
            .await
            .iter()
            .find(|u| u.id.as_str() == id)
            .cloned()
    }

    async fn update<F>(&self, id: &UserId, apply: F) -> Result<User>
    where
        F: FnOnce(&mut User) + Send,
    {
        let mut users = self.users.write().await;
        let user = users
            .iter_mut()
            .find(|u| &u.id == id)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;
        apply(user);
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

#[async_trait]
impl UserRepository for TestUserRepository {
    async fn get_user_by_id(&self, id: &UserId) -> Result<Option<User>> {
        Ok(self.users.read().await.iter().find(|u| &u.id == id).cloned())
    }

    async fn get_users_by_tenant(&self, tenant_id: &TenantId) -> Result<Vec<User>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .filter(|u| u.tenant_id.as_ref() == Some(tenant_id))
            .cloned()
            .collect())
    }

    async fn update_user_role(&self, id: &UserId, role: Role) -> Result<User> {
        self.update(id, |user| user.role = role).await
    }

    async fn update_user_tenant(&self, id: &UserId, tenant_id: &TenantId) -> Result<User> {
        let tenant_id = tenant_id.clone();
        self.update(id, move |user| user.tenant_id = Some(tenant_id))
            .await
    }

    async fn update_user_status(&self, id: &UserId, status: UserStatus) -> Result<User> {
        self.update(id, |user| user.status = status).await
    }
}

/// Configurable test tenant repository
pub struct TestTenantRepository {
    tenants: RwLock<Vec<Tenant>>,
    fail_listing: AtomicBool,
}

impl TestTenantRepository {
    pub fn new() -> Self {
        Self {
            tenants: RwLock::new(vec![]),
            fail_listing: AtomicBool::new(false),
        }
    }

    pub async fn add_tenant(&self, tenant: Tenant) {
        self.tenants.write().await.push(tenant);
    }

    /// Make `list_tenants` fail as if storage were down
    pub fn fail_listing(&self) {
        self.fail_listing.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl TenantRepository for TestTenantRepository {
    async fn get_tenant_by_id(&self, id: &TenantId) -> Result<Option<Tenant>> {
        Ok(self
            .tenants
            .read()
            .await
            .iter()
            .find(|t| &t.id == id)
            .cloned())
    }

    async fn list_tenants(&self) -> Result<Vec<Tenant>> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(AppError::Internal(anyhow::anyhow!("tenant listing unavailable")));
        }
        Ok(self.tenants.read().await.clone())
    }

    async fn update_tenant_status(&self, id: &TenantId, status: TenantStatus) -> Result<Tenant> {
        let mut tenants = self.tenants.write().await;
        let tenant = tenants
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Tenant {} not found", id)))?;
        tenant.status = status;
        tenant.updated_at = Utc::now();
        Ok(tenant.clone())
    }
}

/// Configurable test activity repository with per-tenant failures and delays
pub struct TestActivityRepository {
    activity: RwLock<HashMap<TenantId, TenantActivity>>,
    failing: RwLock<HashSet<TenantId>>,
    slow: RwLock<HashMap<TenantId, Duration>>,
}

impl TestActivityRepository {
    pub fn new() -> Self {
        Self {
            activity: RwLock::new(HashMap::new()),
            failing: RwLock::new(HashSet::new()),
            slow: RwLock::new(HashMap::new()),
        }
    }

    pub async fn set_activity(&self, tenant_id: &str, activity: TenantActivity) {
        self.activity
            .write()
            .await
            .insert(TenantId::from(tenant_id), activity);
    }

    pub async fn fail_for(&self, tenant_id: &str) {
        self.failing.write().await.insert(TenantId::from(tenant_id));
    }

    pub async fn delay_for(&self, tenant_id: &str, delay: Duration) {
        self.slow
            .write()
            .await
            .insert(TenantId::from(tenant_id), delay);
    }
}

#[async_trait]
impl ActivityRepository for TestActivityRepository {
    async fn tenant_activity(&self, tenant_id: &TenantId) -> Result<TenantActivity> {
        if self.failing.read().await.contains(tenant_id) {
            return Err(AppError::Internal(anyhow::anyhow!(
                "activity unavailable for {}",
                tenant_id
            )));
        }
        let delay = self.slow.read().await.get(tenant_id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self
            .activity
            .read()
            .await
            .get(tenant_id)
            .cloned()
            .unwrap_or_default())
    }
}
