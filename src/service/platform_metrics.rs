//! Cross-tenant metrics aggregation
//!
//! Computes metrics one tenant at a time, each scoped through the tenant
//! gate, and folds them into a platform rollup. A tenant whose computation
//! fails or times out is logged, counted and contributes zero.

use crate::config::AggregatorConfig;
use crate::domain::{
    EffectiveIdentity, PlatformMetrics, RoleCounts, Tenant, TenantMetrics, TenantRanking,
};
use crate::error::{AppError, Result};
use crate::policy::gate;
use crate::repository::{ActivityRepository, TenantRepository, UserRepository};
use crate::telemetry::metrics::{AGGREGATION_DURATION_SECONDS, AGGREGATION_TENANT_FAILURES_TOTAL};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

pub struct PlatformMetricsService<U, T, A>
where
    U: UserRepository,
    T: TenantRepository,
    A: ActivityRepository,
{
    users: Arc<U>,
    tenants: Arc<T>,
    activity: Arc<A>,
    config: AggregatorConfig,
}

impl<U, T, A> PlatformMetricsService<U, T, A>
where
    U: UserRepository,
    T: TenantRepository,
    A: ActivityRepository,
{
    pub fn new(users: Arc<U>, tenants: Arc<T>, activity: Arc<A>, config: AggregatorConfig) -> Self {
        Self {
            users,
            tenants,
            activity,
            config,
        }
    }

    /// Platform-wide rollup. Only an effective top-role identity may call this.
    pub async fn aggregate(&self, identity: &EffectiveIdentity) -> Result<PlatformMetrics> {
        gate::platform_scope(identity)?;
        let started = Instant::now();

        let tenants = self.tenants.list_tenants().await?;
        let timeout = self.config.tenant_timeout();

        // `buffered` yields in input order, so the fold below never depends
        // on which tenant finished first
        let outcomes: Vec<(Tenant, Result<TenantMetrics>)> = stream::iter(tenants)
            .map(|tenant| async move {
                let outcome = match tokio::time::timeout(
                    timeout,
                    self.tenant_metrics(identity, &tenant),
                )
                .await
                {
                    Ok(outcome) => outcome,
                    Err(_) => Err(AppError::Internal(anyhow::anyhow!(
                        "metrics for tenant {} timed out after {:?}",
                        tenant.id,
                        timeout
                    ))),
                };
                (tenant, outcome)
            })
            .buffered(self.config.concurrency.max(1))
            .collect()
            .await;

        for (tenant, outcome) in &outcomes {
            if let Err(e) = outcome {
                warn!(tenant_id = %tenant.id, error = %e, "Tenant skipped in platform metrics");
                counter!(AGGREGATION_TENANT_FAILURES_TOTAL).increment(1);
            }
        }

        let metrics = fold(outcomes, self.config.top_n);
        histogram!(AGGREGATION_DURATION_SECONDS).record(started.elapsed().as_secs_f64());
        info!(
            user_id = %identity.user_id(),
            tenants = metrics.tenant_count,
            failed = metrics.failed_tenants.len(),
            "Platform metrics aggregated"
        );
        Ok(metrics)
    }

    async fn tenant_metrics(
        &self,
        identity: &EffectiveIdentity,
        tenant: &Tenant,
    ) -> Result<TenantMetrics> {
        let tenant_id = gate::scoped_tenant(identity, Some(&tenant.id))?.tenant_id;

        let members = self.users.get_users_by_tenant(&tenant_id).await?;
        let activity = self.activity.tenant_activity(&tenant_id).await?;

        let mut members_by_role = RoleCounts::default();
        let mut total_members = 0;
        let mut active_members = 0;
        for member in members
            .iter()
            .filter(|member| member.tenant_id.as_ref() == Some(&tenant_id))
        {
            total_members += 1;
            if member.is_active() {
                active_members += 1;
            }
            members_by_role.record(member.role);
        }

        Ok(TenantMetrics {
            tenant_id,
            tenant_name: tenant.name.clone(),
            total_members,
            active_members,
            members_by_role,
            activity,
        })
    }
}

/// Fold per-tenant outcomes into the platform rollup. Failed tenants are
/// listed and otherwise ignored.
pub fn fold(outcomes: Vec<(Tenant, Result<TenantMetrics>)>, top_n: usize) -> PlatformMetrics {
    let mut rollup = PlatformMetrics {
        generated_at: Utc::now(),
        ..Default::default()
    };
    let mut rankings = Vec::new();

    for (tenant, outcome) in outcomes {
        rollup.tenant_count += 1;
        if tenant.is_active() {
            rollup.active_tenant_count += 1;
        }

        let metrics = match outcome {
            Ok(metrics) => metrics,
            Err(_) => {
                rollup.failed_tenants.push(tenant.id);
                continue;
            }
        };

        rollup.reporting_tenant_count += 1;
        rollup.total_members += metrics.total_members;
        rollup.active_members += metrics.active_members;
        rollup.members_by_role += metrics.members_by_role;
        rollup.assessments_started += metrics.activity.assessments_started;
        rollup.assessments_completed += metrics.activity.assessments_completed;
        rollup.total_posts += metrics.activity.posts;
        rollup.last_activity_at = rollup.last_activity_at.max(metrics.activity.last_activity_at);

        rankings.push(TenantRanking {
            tenant_id: metrics.tenant_id,
            tenant_name: metrics.tenant_name,
            assessments_completed: metrics.activity.assessments_completed,
        });
    }

    rollup.completion_rate = completion_rate(
        rollup.assessments_completed,
        rollup.assessments_started,
    );
    rollup.failed_tenants.sort();
    rollup.top_tenants_by_completions = top_by_completions(rankings, top_n);
    rollup
}

fn completion_rate(completed: u64, started: u64) -> f64 {
    if started == 0 {
        0.0
    } else {
        completed as f64 / started as f64
    }
}

/// Highest completions first; ties by tenant id.
fn top_by_completions(mut rankings: Vec<TenantRanking>, n: usize) -> Vec<TenantRanking> {
    rankings.sort_by(|a, b| {
        b.assessments_completed
            .cmp(&a.assessments_completed)
            .then_with(|| a.tenant_id.cmp(&b.tenant_id))
    });
    rankings.truncate(n);
    rankings
}
