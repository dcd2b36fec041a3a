//! Platform metrics HTTP tests

use super::{build_test_router, get_json, Caller, TestAppState};
use crate::api::{create_test_activity, create_test_tenant, create_test_user};
use flock_core::domain::{Role, UserStatus};
use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;

async fn seeded_state() -> TestAppState {
    let state = TestAppState::new();
    state
        .user_repo
        .add_user(create_test_user("root", Role::SuperAdmin, None))
        .await;

    for tenant in ["church-a", "church-b", "church-c"] {
        state.tenant_repo.add_tenant(create_test_tenant(tenant)).await;
    }
    for (id, role, tenant) in [
        ("a-1", Role::OrgOwner, "church-a"),
        ("a-2", Role::Participant, "church-a"),
        ("b-1", Role::OrgAdmin, "church-b"),
        ("b-2", Role::Participant, "church-b"),
        ("c-1", Role::Participant, "church-c"),
    ] {
        state
            .user_repo
            .add_user(create_test_user(id, role, Some(tenant)))
            .await;
    }
    let mut inactive = create_test_user("b-3", Role::Participant, Some("church-b"));
    inactive.status = UserStatus::Inactive;
    state.user_repo.add_user(inactive).await;

    state
        .activity_repo
        .set_activity("church-a", create_test_activity(10, 5, 3))
        .await;
    state
        .activity_repo
        .set_activity("church-b", create_test_activity(6, 6, 1))
        .await;
    state
        .activity_repo
        .set_activity("church-c", create_test_activity(4, 0, 0))
        .await;
    state
}

#[tokio::test]
async fn test_platform_metrics_sums_every_tenant() {
    let app = build_test_router(seeded_state().await);

    let (status, body) = get_json(&app, "/api/v1/platform/metrics", Caller::user("root")).await;

    assert_eq!(status, StatusCode::OK);
    let data = &body.unwrap()["data"];
    assert_eq!(data["tenant_count"], 3);
    assert_eq!(data["reporting_tenant_count"], 3);
    assert_eq!(data["failed_tenants"], json!([]));
    assert_eq!(data["total_members"], 6);
    assert_eq!(data["active_members"], 5);
    assert_eq!(data["members_by_role"]["participants"], 4);
    assert_eq!(data["members_by_role"]["org_admins"], 1);
    assert_eq!(data["members_by_role"]["org_owners"], 1);
    assert_eq!(data["assessments_started"], 20);
    assert_eq!(data["assessments_completed"], 11);
    assert_eq!(data["completion_rate"], 0.55);
    assert_eq!(data["total_posts"], 4);

    let top: Vec<&str> = data["top_tenants_by_completions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["tenant_id"].as_str().unwrap())
        .collect();
    assert_eq!(top, vec!["church-b", "church-a", "church-c"]);
}

#[tokio::test]
async fn test_failing_tenant_contributes_zero() {
    let state = seeded_state().await;
    state.activity_repo.fail_for("church-a").await;
    let app = build_test_router(state);

    let (status, body) = get_json(&app, "/api/v1/platform/metrics", Caller::user("root")).await;

    assert_eq!(status, StatusCode::OK);
    let data = &body.unwrap()["data"];
    assert_eq!(data["tenant_count"], 3);
    assert_eq!(data["reporting_tenant_count"], 2);
    assert_eq!(data["failed_tenants"], json!(["church-a"]));
    assert_eq!(data["total_members"], 4);
    assert_eq!(data["assessments_completed"], 6);
}

#[tokio::test]
async fn test_slow_tenant_times_out() {
    let state = seeded_state().await;
    state
        .activity_repo
        .delay_for("church-c", Duration::from_secs(5))
        .await;
    let app = build_test_router(state);

    let (status, body) = get_json(&app, "/api/v1/platform/metrics", Caller::user("root")).await;

    assert_eq!(status, StatusCode::OK);
    let data = &body.unwrap()["data"];
    assert_eq!(data["failed_tenants"], json!(["church-c"]));
    assert_eq!(data["reporting_tenant_count"], 2);
}

#[tokio::test]
async fn test_tenant_listing_failure_fails_request() {
    let state = seeded_state().await;
    state.tenant_repo.fail_listing();
    let app = build_test_router(state);

    let (status, body) = get_json(&app, "/api/v1/platform/metrics", Caller::user("root")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body.unwrap()["error"], "internal_error");
}

#[tokio::test]
async fn test_no_tenants_yields_empty_rollup() {
    let state = TestAppState::new();
    state
        .user_repo
        .add_user(create_test_user("root", Role::SuperAdmin, None))
        .await;
    let app = build_test_router(state);

    let (status, body) = get_json(&app, "/api/v1/platform/metrics", Caller::user("root")).await;

    assert_eq!(status, StatusCode::OK);
    let data = &body.unwrap()["data"];
    assert_eq!(data["tenant_count"], 0);
    assert_eq!(data["completion_rate"], 0.0);
    assert_eq!(data["top_tenants_by_completions"], json!([]));
}
