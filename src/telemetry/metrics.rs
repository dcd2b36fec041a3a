//! Prometheus metrics setup and metric definitions

use anyhow::Context;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub const ACCESS_DECISIONS_TOTAL: &str = "flock_access_decisions_total";
pub const VIEW_AS_TOTAL: &str = "flock_view_as_total";
pub const AGGREGATION_TENANT_FAILURES_TOTAL: &str = "flock_aggregation_tenant_failures_total";
pub const AGGREGATION_DURATION_SECONDS: &str = "flock_aggregation_duration_seconds";

/// Install the Prometheus recorder and return a handle for rendering metrics.
pub fn install_prometheus_recorder() -> anyhow::Result<PrometheusHandle> {
    // Aggregation fans out over every tenant, so the tail reaches past 10s
    let buckets = [
        0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
    ];

    PrometheusBuilder::new()
        .set_buckets(&buckets)
        .context("failed to set histogram buckets")?
        .install_recorder()
        .context("failed to install Prometheus recorder")
}

/// Register metric descriptions and emit initial zero values so Prometheus output
/// includes HELP/TYPE lines for all metrics from startup.
pub fn describe_metrics() {
    describe_counter!(
        ACCESS_DECISIONS_TOTAL,
        "Access checks by kind and outcome"
    );
    describe_counter!(
        VIEW_AS_TOTAL,
        "View-as grants, clears and expiries"
    );
    describe_counter!(
        AGGREGATION_TENANT_FAILURES_TOTAL,
        "Tenants skipped during platform metrics aggregation"
    );
    describe_histogram!(
        AGGREGATION_DURATION_SECONDS,
        "Platform metrics aggregation duration in seconds"
    );

    counter!(ACCESS_DECISIONS_TOTAL, "check" => "role", "outcome" => "allow").absolute(0);
    counter!(ACCESS_DECISIONS_TOTAL, "check" => "role", "outcome" => "deny").absolute(0);
    counter!(VIEW_AS_TOTAL, "action" => "grant").absolute(0);
    counter!(AGGREGATION_TENANT_FAILURES_TOTAL).absolute(0);
    histogram!(AGGREGATION_DURATION_SECONDS).record(0.0);
}
