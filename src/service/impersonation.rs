//! "View as" impersonation contexts
//!
//! A context lives in the caller's session under [`keys::VIEW_AS`] as JSON.
//! Grants overwrite, clears are idempotent, and every cleanup of a stale
//! context is a compare-and-delete so a concurrent fresh grant survives.

use crate::domain::{
    EffectiveIdentity, ImpersonationContext, Principal, Role, SessionId, TenantId,
};
use crate::error::{AppError, Result};
use crate::repository::TenantRepository;
use crate::session::{keys, SessionStore};
use crate::telemetry::metrics::VIEW_AS_TOTAL;
use chrono::{DateTime, Duration, Utc};
use metrics::counter;
use std::sync::Arc;
use tracing::{info, warn};

/// Why a stored context was discarded instead of applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Discard {
    Malformed,
    Expired,
    Revoked,
}

impl Discard {
    fn as_str(self) -> &'static str {
        match self {
            Discard::Malformed => "malformed",
            Discard::Expired => "expire",
            Discard::Revoked => "revoke",
        }
    }
}

pub struct ImpersonationService<T: TenantRepository> {
    sessions: Arc<dyn SessionStore>,
    tenants: Arc<T>,
    ttl: Option<Duration>,
}

impl<T: TenantRepository> ImpersonationService<T> {
    /// `ttl` of `None` keeps a context for the lifetime of the session.
    pub fn new(sessions: Arc<dyn SessionStore>, tenants: Arc<T>, ttl: Option<Duration>) -> Self {
        Self {
            sessions,
            tenants,
            ttl,
        }
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    /// Only a caller whose real role is the top of the hierarchy may grant,
    /// whatever state its session is in.
    pub fn authorize_grant(&self, real: &Principal) -> Result<()> {
        if real.role.is_top() {
            return Ok(());
        }
        warn!(
            user_id = %real.user_id,
            real_role = %real.role,
            "View-as denied: caller is not {}",
            Role::TOP
        );
        counter!(VIEW_AS_TOTAL, "action" => "denied").increment(1);
        Err(AppError::Forbidden(format!(
            "Only {} may view as another role",
            Role::TOP
        )))
    }

    /// Start viewing as `effective_role`, optionally inside `effective_tenant_id`.
    ///
    /// Any existing context on the session is replaced.
    pub async fn grant(
        &self,
        session: &SessionId,
        real: &Principal,
        effective_role: Role,
        effective_tenant_id: Option<TenantId>,
    ) -> Result<ImpersonationContext> {
        self.authorize_grant(real)?;

        if let Some(tenant_id) = &effective_tenant_id {
            if self.tenants.get_tenant_by_id(tenant_id).await?.is_none() {
                return Err(AppError::NotFound(format!("Tenant {} not found", tenant_id)));
            }
        }

        let now = Utc::now();
        let context = ImpersonationContext {
            granted_by: real.user_id.clone(),
            effective_role,
            effective_tenant_id,
            created_at: now,
            expires_at: self.ttl.map(|ttl| now + ttl),
        };
        let value = serde_json::to_string(&context).map_err(|e| AppError::Internal(e.into()))?;
        self.sessions.set(session, keys::VIEW_AS, value).await?;

        info!(
            user_id = %real.user_id,
            real_role = %real.role,
            effective_role = %context.effective_role,
            effective_tenant_id = ?context.effective_tenant_id,
            expires_at = ?context.expires_at,
            "View-as granted"
        );
        counter!(VIEW_AS_TOTAL, "action" => "grant").increment(1);
        Ok(context)
    }

    /// The active context, if any. Never modifies the session.
    pub async fn read(&self, session: &SessionId) -> Result<Option<ImpersonationContext>> {
        let Some(raw) = self.sessions.get(session, keys::VIEW_AS).await? else {
            return Ok(None);
        };
        Ok(decode(&raw).filter(|context| !context.is_expired_at(Utc::now())))
    }

    /// Stop viewing as. Clearing a clear session succeeds.
    pub async fn clear(&self, session: &SessionId) -> Result<()> {
        self.sessions.delete(session, keys::VIEW_AS).await?;
        info!("View-as cleared");
        counter!(VIEW_AS_TOTAL, "action" => "clear").increment(1);
        Ok(())
    }

    /// The identity every authorization decision in this request must use.
    ///
    /// Without a session or an applicable context this is the real principal.
    /// Malformed, expired or revoked contexts are removed and ignored.
    pub async fn current(
        &self,
        session: Option<&SessionId>,
        real: Principal,
    ) -> Result<EffectiveIdentity> {
        let Some(session) = session else {
            return Ok(EffectiveIdentity::from_principal(real));
        };
        let Some(raw) = self.sessions.get(session, keys::VIEW_AS).await? else {
            return Ok(EffectiveIdentity::from_principal(real));
        };

        match applicable(&raw, &real, Utc::now()) {
            Ok(context) => Ok(EffectiveIdentity::impersonating(real, context)),
            Err(reason) => {
                let removed = self
                    .sessions
                    .compare_and_delete(session, keys::VIEW_AS, &raw)
                    .await?;
                if removed {
                    info!(
                        user_id = %real.user_id,
                        real_role = %real.role,
                        reason = reason.as_str(),
                        "View-as context discarded"
                    );
                    counter!(VIEW_AS_TOTAL, "action" => reason.as_str()).increment(1);
                }
                Ok(EffectiveIdentity::from_principal(real))
            }
        }
    }
}

fn decode(raw: &str) -> Option<ImpersonationContext> {
    match serde_json::from_str(raw) {
        Ok(context) => Some(context),
        Err(e) => {
            warn!(error = %e, "Ignoring malformed view-as context");
            None
        }
    }
}

/// A stored context applies only while unexpired, granted by this same
/// principal, and that principal is still the top role.
fn applicable(
    raw: &str,
    real: &Principal,
    now: DateTime<Utc>,
) -> std::result::Result<ImpersonationContext, Discard> {
    let context = decode(raw).ok_or(Discard::Malformed)?;
    if context.is_expired_at(now) {
        return Err(Discard::Expired);
    }
    if context.granted_by != real.user_id || !real.role.is_top() {
        return Err(Discard::Revoked);
    }
    Ok(context)
}
