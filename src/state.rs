//! Application state trait for dependency injection
//!
//! Handlers and guards are generic over [`HasServices`] so the same router
//! runs against the MySQL-backed [`crate::server::AppState`] in production
//! and against in-memory repositories in tests.

use crate::config::Config;
use crate::repository::{ActivityRepository, TenantRepository, UserRepository};
use crate::service::{
    AccessService, ImpersonationService, MembershipService, PlatformMetricsService,
};

pub trait HasServices: Clone + Send + Sync + 'static {
    type UserRepo: UserRepository + 'static;
    type TenantRepo: TenantRepository + 'static;
    type ActivityRepo: ActivityRepository + 'static;

    fn config(&self) -> &Config;

    /// Resolves the effective identity of every guarded request
    fn access_service(&self) -> &AccessService<Self::UserRepo, Self::TenantRepo>;

    fn impersonation_service(&self) -> &ImpersonationService<Self::TenantRepo>;

    fn membership_service(&self) -> &MembershipService<Self::UserRepo, Self::TenantRepo>;

    fn platform_metrics_service(
        &self,
    ) -> &PlatformMetricsService<Self::UserRepo, Self::TenantRepo, Self::ActivityRepo>;

    /// Returns (db_ok, session_store_ok)
    fn check_ready(&self) -> impl std::future::Future<Output = (bool, bool)> + Send;
}
