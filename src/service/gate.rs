//! Tenant-scoped query gate backed by the tenant repository

use crate::domain::{EffectiveIdentity, TenantId};
use crate::error::{AppError, Result};
use crate::policy::gate::{self, TenantSource};
use crate::repository::TenantRepository;
use std::sync::Arc;

/// Resolves the tenant every scoped read filters by.
///
/// Applies [`gate::scoped_tenant`] and additionally checks that a top-role
/// tenant hint names a real tenant, so a typo never reads as "no activity".
pub struct TenantGate<T: TenantRepository> {
    tenants: Arc<T>,
}

impl<T: TenantRepository> TenantGate<T> {
    pub fn new(tenants: Arc<T>) -> Self {
        Self { tenants }
    }

    pub async fn resolve(
        &self,
        identity: &EffectiveIdentity,
        explicit_tenant_id: Option<&TenantId>,
    ) -> Result<TenantId> {
        let scoped = gate::scoped_tenant(identity, explicit_tenant_id)?;
        if scoped.source == TenantSource::Hint
            && self
                .tenants
                .get_tenant_by_id(&scoped.tenant_id)
                .await?
                .is_none()
        {
            return Err(AppError::NotFound(format!(
                "Tenant {} not found",
                scoped.tenant_id
            )));
        }
        Ok(scoped.tenant_id)
    }
}
