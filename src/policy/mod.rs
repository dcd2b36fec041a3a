//! Centralized authorization policy for HTTP handlers.
//!
//! Every check here works on an [`EffectiveIdentity`]; the real role is never
//! consulted for a decision.

pub mod gate;
pub mod table;

use crate::domain::{EffectiveIdentity, Permission, Role};
use crate::error::AppError;
use std::fmt;
use std::str::FromStr;

pub type PolicyResult<T> = std::result::Result<T, AppError>;

/// What a route group or handler demands of the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessRequirement {
    /// Any resolvable identity
    Authenticated,
    /// Structural gating: effective role at or above the floor
    Role(Role),
    /// Feature gating: effective role holds the permission
    Permission(Permission),
}

impl AccessRequirement {
    fn check_label(self) -> &'static str {
        match self {
            AccessRequirement::Authenticated => "authenticated",
            AccessRequirement::Role(_) => "role",
            AccessRequirement::Permission(_) => "permission",
        }
    }
}

impl fmt::Display for AccessRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessRequirement::Authenticated => f.write_str("authenticated"),
            AccessRequirement::Role(role) => write!(f, "role:{}", role),
            AccessRequirement::Permission(permission) => write!(f, "permission:{}", permission),
        }
    }
}

/// Parses `authenticated`, `role:<ROLE>` or `permission:<token>`.
///
/// Unknown role or permission tokens surface as configuration faults.
impl FromStr for AccessRequirement {
    type Err = AppError;

    fn from_str(s: &str) -> PolicyResult<Self> {
        if s == "authenticated" {
            return Ok(AccessRequirement::Authenticated);
        }
        match s.split_once(':') {
            Some(("role", token)) => Ok(AccessRequirement::Role(token.parse()?)),
            Some(("permission", token)) => Ok(AccessRequirement::Permission(token.parse()?)),
            _ => Err(AppError::BadRequest(format!(
                "Malformed access requirement: {}",
                s
            ))),
        }
    }
}

/// `requireRole`: effective role must be at least `min_role`.
pub fn enforce_role(identity: &EffectiveIdentity, min_role: Role) -> PolicyResult<()> {
    if identity.role.at_least(min_role) {
        return Ok(());
    }
    tracing::warn!(
        user_id = %identity.user_id(),
        effective_role = %identity.role,
        required_role = %min_role,
        view_as = identity.is_impersonating(),
        "Access denied: insufficient role"
    );
    Err(AppError::InsufficientRole {
        required: min_role,
        actual: identity.role,
    })
}

/// `requirePermission`: effective role must hold `permission` (or the wildcard).
pub fn enforce_permission(identity: &EffectiveIdentity, permission: Permission) -> PolicyResult<()> {
    if identity.has_permission(permission) {
        return Ok(());
    }
    tracing::warn!(
        user_id = %identity.user_id(),
        effective_role = %identity.role,
        required_permission = %permission,
        view_as = identity.is_impersonating(),
        "Access denied: missing permission"
    );
    Err(AppError::MissingPermission {
        required: permission,
        role: identity.role,
    })
}

pub fn enforce(identity: &EffectiveIdentity, requirement: AccessRequirement) -> PolicyResult<()> {
    let outcome = match requirement {
        AccessRequirement::Authenticated => Ok(()),
        AccessRequirement::Role(min_role) => enforce_role(identity, min_role),
        AccessRequirement::Permission(permission) => enforce_permission(identity, permission),
    };
    metrics::counter!(
        crate::telemetry::metrics::ACCESS_DECISIONS_TOTAL,
        "check" => requirement.check_label(),
        "outcome" => if outcome.is_ok() { "allow" } else { "deny" }
    )
    .increment(1);
    outcome
}
