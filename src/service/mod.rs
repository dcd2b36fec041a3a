//! Business logic layer

pub mod access;
pub mod gate;
pub mod identity;
pub mod impersonation;
pub mod membership;
pub mod platform_metrics;

pub use access::AccessService;
pub use gate::TenantGate;
pub use identity::IdentityResolver;
pub use impersonation::ImpersonationService;
pub use membership::MembershipService;
pub use platform_metrics::PlatformMetricsService;
