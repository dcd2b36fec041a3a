//! Per-tenant and platform-wide activity metrics

use super::common::TenantId;
use super::role::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

/// Member counts per role inside one tenant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCounts {
    pub participants: u64,
    pub org_leaders: u64,
    pub org_admins: u64,
    pub org_owners: u64,
}

impl RoleCounts {
    pub fn record(&mut self, role: Role) {
        match role {
            Role::Participant => self.participants += 1,
            Role::OrgLeader => self.org_leaders += 1,
            Role::OrgAdmin => self.org_admins += 1,
            Role::OrgOwner => self.org_owners += 1,
            // Platform operators are not tenant members
            Role::SuperAdmin => {}
        }
    }
}

impl AddAssign for RoleCounts {
    fn add_assign(&mut self, rhs: Self) {
        self.participants += rhs.participants;
        self.org_leaders += rhs.org_leaders;
        self.org_admins += rhs.org_admins;
        self.org_owners += rhs.org_owners;
    }
}

/// Activity counters reported by the surrounding application for one tenant
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantActivity {
    pub assessments_started: u64,
    pub assessments_completed: u64,
    pub posts: u64,
    pub last_activity_at: Option<DateTime<Utc>>,
}

/// Metrics computed for a single tenant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantMetrics {
    pub tenant_id: TenantId,
    pub tenant_name: String,
    pub total_members: u64,
    pub active_members: u64,
    pub members_by_role: RoleCounts,
    pub activity: TenantActivity,
}

/// A tenant's position in a top-N ranking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantRanking {
    pub tenant_id: TenantId,
    pub tenant_name: String,
    pub assessments_completed: u64,
}

/// Platform-wide rollup across every tenant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformMetrics {
    pub tenant_count: u64,
    pub active_tenant_count: u64,
    /// Tenants whose metrics were folded in
    pub reporting_tenant_count: u64,
    /// Tenants whose computation failed and contributed zero
    pub failed_tenants: Vec<TenantId>,
    pub total_members: u64,
    pub active_members: u64,
    pub members_by_role: RoleCounts,
    pub assessments_started: u64,
    pub assessments_completed: u64,
    /// `assessments_completed / assessments_started`, 0.0 when nothing started
    pub completion_rate: f64,
    pub total_posts: u64,
    pub last_activity_at: Option<DateTime<Utc>>,
    pub top_tenants_by_completions: Vec<TenantRanking>,
    pub generated_at: DateTime<Utc>,
}
