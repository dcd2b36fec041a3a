//! Access guard HTTP tests
//!
//! Authentication, role and permission rejections at the route-group level.

use super::{build_test_router, get_json, patch_json, Caller, TestAppState};
use crate::api::{create_test_tenant, create_test_user};
use flock_core::domain::{Role, UserStatus};
use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

async fn seeded_state() -> TestAppState {
    let state = TestAppState::new();
    state.tenant_repo.add_tenant(create_test_tenant("church-1")).await;
    for (id, role) in [
        ("participant-1", Role::Participant),
        ("leader-1", Role::OrgLeader),
        ("admin-1", Role::OrgAdmin),
    ] {
        state
            .user_repo
            .add_user(create_test_user(id, role, Some("church-1")))
            .await;
    }
    state
}

#[tokio::test]
async fn test_missing_principal_returns_401() {
    let app = build_test_router(seeded_state().await);

    let (status, body) = get_json(&app, "/api/v1/members", Caller::anonymous()).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body.unwrap()["reason"], "unauthenticated");
}

#[tokio::test]
async fn test_unknown_principal_returns_401() {
    let app = build_test_router(seeded_state().await);

    let (status, _) = get_json(&app, "/api/v1/view-as", Caller::user("ghost")).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_inactive_user_returns_401() {
    let state = seeded_state().await;
    let mut inactive = create_test_user("gone-1", Role::OrgAdmin, Some("church-1"));
    inactive.status = UserStatus::Inactive;
    state.user_repo.add_user(inactive).await;
    let app = build_test_router(state);

    let (status, _) = get_json(&app, "/api/v1/members", Caller::user("gone-1")).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_participant_on_admin_route_gets_insufficient_role() {
    let app = build_test_router(seeded_state().await);

    let (status, body) = patch_json(
        &app,
        "/api/v1/users/leader-1/role",
        Caller::user("participant-1"),
        json!({ "role": "PARTICIPANT" }),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    let body = body.unwrap();
    assert_eq!(body["reason"], "insufficient_role");
    assert_eq!(body["required_role"], "ORG_ADMIN");
    assert_eq!(body["actual_role"], "PARTICIPANT");
}

#[tokio::test]
async fn test_participant_lacks_view_members_permission() {
    let app = build_test_router(seeded_state().await);

    let (status, body) = get_json(&app, "/api/v1/members", Caller::user("participant-1")).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    let body = body.unwrap();
    assert_eq!(body["reason"], "missing_permission");
    assert_eq!(body["required_permission"], "view_members");
}

#[tokio::test]
async fn test_org_admin_cannot_reach_platform_routes() {
    let app = build_test_router(seeded_state().await);

    let (status, body) =
        get_json(&app, "/api/v1/platform/metrics", Caller::user("admin-1")).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body.unwrap()["required_role"], "SUPER_ADMIN");
}

#[tokio::test]
async fn test_health_needs_no_identity() {
    let app = build_test_router(TestAppState::new());

    let (status, body) = get_json(&app, "/health", Caller::anonymous()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["status"], "healthy");
}

#[tokio::test]
async fn test_ready_reports_ok() {
    let app = build_test_router(TestAppState::new());

    let (status, _) = get_json(&app, "/ready", Caller::anonymous()).await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_metrics_endpoint_disabled_without_recorder() {
    let app = build_test_router(TestAppState::new());

    let (status, _) = get_json(&app, "/metrics", Caller::anonymous()).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
