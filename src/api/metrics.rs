//! Prometheus scrape endpoint and the platform metrics rollup

use crate::api::SuccessResponse;
use crate::domain::PlatformMetrics;
use crate::error::Result;
use crate::middleware::Effective;
use crate::state::HasServices;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// GET /metrics: Prometheus text exposition format.
pub async fn metrics_handler(
    State(handle): State<Arc<Option<PrometheusHandle>>>,
) -> impl IntoResponse {
    match handle.as_ref() {
        Some(h) => (StatusCode::OK, h.render()),
        None => (StatusCode::NOT_FOUND, "Metrics not enabled".to_string()),
    }
}

/// GET /api/v1/platform/metrics
pub async fn platform_metrics<S: HasServices>(
    State(state): State<S>,
    Effective(identity): Effective,
) -> Result<Json<SuccessResponse<PlatformMetrics>>> {
    let metrics = state
        .platform_metrics_service()
        .aggregate(&identity)
        .await?;
    Ok(Json(SuccessResponse::new(metrics)))
}
