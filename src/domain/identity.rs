//! Real and effective identities, and the view-as context that links them

use super::common::{TenantId, UserId};
use super::permission::Permission;
use super::role::Role;
use super::user::User;
use crate::policy::table;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The real, authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: UserId,
    pub role: Role,
    pub tenant_id: Option<TenantId>,
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id.clone(),
            role: user.role,
            tenant_id: user.tenant_id.clone(),
        }
    }
}

/// "View as" override stored in the caller's session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpersonationContext {
    /// The real identity that created the context
    pub granted_by: UserId,
    pub effective_role: Role,
    pub effective_tenant_id: Option<TenantId>,
    pub created_at: DateTime<Utc>,
    /// `None` means the context lives as long as the session
    pub expires_at: Option<DateTime<Utc>>,
}

impl ImpersonationContext {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }
}

/// The identity every authorization decision is made against.
///
/// Produced once per request by [`crate::service::AccessService`] and passed
/// explicitly to the gate and to services. Equal to the real principal unless
/// a view-as context overrides role and tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveIdentity {
    pub role: Role,
    pub tenant_id: Option<TenantId>,
    /// Kept for the audit trail; never consulted for authorization
    pub real: Principal,
    pub view_as: Option<ImpersonationContext>,
}

impl EffectiveIdentity {
    pub fn from_principal(real: Principal) -> Self {
        Self {
            role: real.role,
            tenant_id: real.tenant_id.clone(),
            real,
            view_as: None,
        }
    }

    pub fn impersonating(real: Principal, context: ImpersonationContext) -> Self {
        Self {
            role: context.effective_role,
            tenant_id: context.effective_tenant_id.clone(),
            real,
            view_as: Some(context),
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.real.user_id
    }

    pub fn is_impersonating(&self) -> bool {
        self.view_as.is_some()
    }

    pub fn is_top(&self) -> bool {
        self.role.is_top()
    }

    /// Capabilities of the effective role
    pub fn capabilities(&self) -> &'static HashSet<Permission> {
        table::permissions_for(self.role)
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        table::has_permission(self.role, permission)
    }
}
