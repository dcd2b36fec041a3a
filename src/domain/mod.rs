//! Domain models for Flock Core

pub mod common;
pub mod identity;
pub mod metrics;
pub mod permission;
pub mod role;
pub mod tenant;
pub mod user;

pub use common::{SessionId, TenantId, UserId};
pub use identity::{EffectiveIdentity, ImpersonationContext, Principal};
pub use metrics::{
    PlatformMetrics, RoleCounts, TenantActivity, TenantMetrics, TenantRanking,
};
pub use permission::Permission;
pub use role::Role;
pub use tenant::{Tenant, TenantStatus};
pub use user::{MemberSummary, User, UserStatus};
