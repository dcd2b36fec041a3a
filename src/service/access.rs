//! Access decision engine
//!
//! Turns the raw caller (principal id plus optional session) into the
//! [`EffectiveIdentity`] used for the rest of the request, then applies an
//! [`AccessRequirement`] to it.

use super::identity::IdentityResolver;
use super::impersonation::ImpersonationService;
use crate::domain::{EffectiveIdentity, Principal, SessionId, UserId};
use crate::error::{AppError, Result};
use crate::policy::{self, AccessRequirement};
use crate::repository::{TenantRepository, UserRepository};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct AccessService<U: UserRepository, T: TenantRepository> {
    resolver: IdentityResolver<U>,
    impersonation: Arc<ImpersonationService<T>>,
}

impl<U: UserRepository, T: TenantRepository> AccessService<U, T> {
    pub fn new(users: Arc<U>, impersonation: Arc<ImpersonationService<T>>) -> Self {
        Self {
            resolver: IdentityResolver::new(users),
            impersonation,
        }
    }

    /// Resolve the effective identity of the caller.
    ///
    /// A missing principal, an unknown user and an inactive user are all
    /// `Unauthenticated`. Storage failures surface unchanged.
    pub async fn authenticate(
        &self,
        principal_id: Option<&UserId>,
        session: Option<&SessionId>,
    ) -> Result<EffectiveIdentity> {
        let principal_id = principal_id
            .ok_or_else(|| AppError::Unauthenticated("Missing principal".to_string()))?;

        let user = match self.resolver.resolve(principal_id).await {
            Ok(user) => user,
            Err(AppError::NotFound(_)) => {
                debug!(user_id = %principal_id, "Principal does not resolve to a user");
                return Err(AppError::Unauthenticated("Unknown principal".to_string()));
            }
            Err(e) => return Err(e),
        };

        if !user.is_active() {
            warn!(user_id = %user.id, "Inactive user rejected");
            return Err(AppError::Unauthenticated("User is inactive".to_string()));
        }
        if !user.has_valid_tenancy() {
            // Still admitted; the tenant gate fails closed for this user
            warn!(user_id = %user.id, role = %user.role, "User has no tenant assigned");
        }

        self.impersonation
            .current(session, Principal::from(&user))
            .await
    }

    /// `authenticate` followed by the requirement check.
    pub async fn authorize(
        &self,
        principal_id: Option<&UserId>,
        session: Option<&SessionId>,
        requirement: AccessRequirement,
    ) -> Result<EffectiveIdentity> {
        let identity = self.authenticate(principal_id, session).await?;
        policy::enforce(&identity, requirement)?;
        Ok(identity)
    }
}
