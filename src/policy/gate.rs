//! Tenant scoping rules
//!
//! Decides which tenant a data query must filter by. A caller-supplied tenant
//! id is a hint for the top role only; every other role is clamped to its own
//! effective tenant.

use super::PolicyResult;
use crate::domain::{EffectiveIdentity, TenantId};
use crate::error::AppError;

/// Where a resolved tenant id came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenantSource {
    /// The caller's own (or impersonated) tenant
    Identity,
    /// A top-role hint that must be checked against the tenant list
    Hint,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedTenant {
    pub tenant_id: TenantId,
    pub source: TenantSource,
}

/// Resolve the tenant a tenant-scoped query must filter by.
///
/// * top role with an explicit tenant: that tenant
/// * top role viewing as a specific tenant: the view-as tenant
/// * top role with neither: [`AppError::TenantRequired`]; only the platform
///   aggregator may query without a tenant, through [`platform_scope`]
/// * any other role: its effective tenant, whatever was supplied
pub fn scoped_tenant(
    identity: &EffectiveIdentity,
    explicit_tenant_id: Option<&TenantId>,
) -> PolicyResult<ScopedTenant> {
    if identity.is_top() {
        if let Some(tenant_id) = explicit_tenant_id {
            return Ok(ScopedTenant {
                tenant_id: tenant_id.clone(),
                source: TenantSource::Hint,
            });
        }
        let view_as_tenant = identity
            .view_as
            .as_ref()
            .and_then(|context| context.effective_tenant_id.clone());
        return match view_as_tenant {
            Some(tenant_id) => Ok(ScopedTenant {
                tenant_id,
                source: TenantSource::Identity,
            }),
            None => Err(AppError::TenantRequired),
        };
    }

    let own_tenant = identity.tenant_id.clone().ok_or(AppError::TenantRequired)?;

    if let Some(supplied) = explicit_tenant_id {
        if supplied != &own_tenant {
            tracing::warn!(
                user_id = %identity.user_id(),
                effective_role = %identity.role,
                "Ignoring caller-supplied tenant id outside the caller's scope"
            );
        }
    }

    Ok(ScopedTenant {
        tenant_id: own_tenant,
        source: TenantSource::Identity,
    })
}

/// Admit an unscoped, platform-wide query. Only the effective top role passes.
pub fn platform_scope(identity: &EffectiveIdentity) -> PolicyResult<()> {
    if identity.is_top() {
        Ok(())
    } else {
        Err(AppError::InsufficientRole {
            required: crate::domain::Role::TOP,
            actual: identity.role,
        })
    }
}
