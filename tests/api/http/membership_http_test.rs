//! Membership administration HTTP tests
//!
//! Listing, role changes, status changes and transfers, all confined to the
//! caller's tenant.

use super::{build_test_router, get_json, patch_json, post_json, Caller, TestAppState};
use crate::api::{create_test_tenant, create_test_user};
use flock_core::domain::{Role, TenantStatus, UserStatus};
use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

async fn seeded_state() -> TestAppState {
    let state = TestAppState::new();
    for tenant in ["church-1", "church-2"] {
        state.tenant_repo.add_tenant(create_test_tenant(tenant)).await;
    }
    let mut closed = create_test_tenant("church-closed");
    closed.status = TenantStatus::Inactive;
    state.tenant_repo.add_tenant(closed).await;

    state
        .user_repo
        .add_user(create_test_user("root", Role::SuperAdmin, None))
        .await;
    for (id, role, tenant) in [
        ("admin-1", Role::OrgAdmin, "church-1"),
        ("admin-1b", Role::OrgAdmin, "church-1"),
        ("owner-1", Role::OrgOwner, "church-1"),
        ("member-1", Role::Participant, "church-1"),
        ("member-2", Role::Participant, "church-2"),
    ] {
        state
            .user_repo
            .add_user(create_test_user(id, role, Some(tenant)))
            .await;
    }
    state
}

#[tokio::test]
async fn test_list_members_is_tenant_scoped() {
    let app = build_test_router(seeded_state().await);

    // The supplied tenant is ignored for a tenant-bound caller
    let (status, body) = get_json(
        &app,
        "/api/v1/members?tenant_id=church-2",
        Caller::user("admin-1"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    let members = body["data"].as_array().unwrap();
    assert_eq!(members.len(), 4);
    assert!(members.iter().all(|m| m["id"] != "member-2"));
    assert!(members.iter().all(|m| m.get("tenant_id").is_none()));
}

#[tokio::test]
async fn test_admin_changes_participant_role() {
    let state = seeded_state().await;
    let users = state.user_repo.clone();
    let app = build_test_router(state);

    let (status, body) = patch_json(
        &app,
        "/api/v1/users/member-1/role",
        Caller::user("admin-1"),
        json!({ "role": "ORG_LEADER" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["data"]["role"], "ORG_LEADER");
    assert_eq!(users.find("member-1").await.unwrap().role, Role::OrgLeader);
}

#[tokio::test]
async fn test_admin_cannot_assign_own_level() {
    let app = build_test_router(seeded_state().await);

    let (status, _) = patch_json(
        &app,
        "/api/v1/users/member-1/role",
        Caller::user("admin-1"),
        json!({ "role": "ORG_ADMIN" }),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_cannot_manage_peer() {
    let app = build_test_router(seeded_state().await);

    let (status, _) = patch_json(
        &app,
        "/api/v1/users/admin-1b/status",
        Caller::user("admin-1"),
        json!({ "status": "INACTIVE" }),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_user_in_other_tenant_reads_as_missing() {
    let app = build_test_router(seeded_state().await);

    let (status, body) = patch_json(
        &app,
        "/api/v1/users/member-2/role",
        Caller::user("admin-1"),
        json!({ "role": "ORG_LEADER" }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body.unwrap()["reason"], "not_found");
}

#[tokio::test]
async fn test_deactivated_user_is_locked_out() {
    let app = build_test_router(seeded_state().await);

    let (status, body) = patch_json(
        &app,
        "/api/v1/users/admin-1b/status",
        Caller::user("owner-1"),
        json!({ "status": "INACTIVE" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["data"]["status"], "INACTIVE");

    let (status, _) = get_json(&app, "/api/v1/members", Caller::user("admin-1b")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_tenant_bound_admin_cannot_transfer_out() {
    let app = build_test_router(seeded_state().await);

    let (status, _) = post_json(
        &app,
        "/api/v1/users/member-1/transfer",
        Caller::user("owner-1"),
        json!({ "tenant_id": "church-2" }),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_top_role_transfers_between_tenants() {
    let state = seeded_state().await;
    let users = state.user_repo.clone();
    let app = build_test_router(state);

    let (status, _) = post_json(
        &app,
        "/api/v1/users/member-1/transfer",
        Caller::user("root"),
        json!({ "tenant_id": "church-2" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let moved = users.find("member-1").await.unwrap();
    assert_eq!(moved.tenant_id.as_deref(), Some("church-2"));
}

#[tokio::test]
async fn test_transfer_into_inactive_tenant_is_rejected() {
    let app = build_test_router(seeded_state().await);

    let (status, _) = post_json(
        &app,
        "/api/v1/users/member-1/transfer",
        Caller::user("root"),
        json!({ "tenant_id": "church-closed" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_tenant_status_is_platform_only() {
    let app = build_test_router(seeded_state().await);

    let (status, _) = patch_json(
        &app,
        "/api/v1/tenants/church-2/status",
        Caller::user("owner-1"),
        json!({ "status": "INACTIVE" }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = patch_json(
        &app,
        "/api/v1/tenants/church-2/status",
        Caller::user("root"),
        json!({ "status": "INACTIVE" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["data"]["status"], "INACTIVE");
}

#[tokio::test]
async fn test_user_status_change_keeps_record() {
    let state = seeded_state().await;
    let users = state.user_repo.clone();
    let app = build_test_router(state);

    patch_json(
        &app,
        "/api/v1/users/member-1/status",
        Caller::user("admin-1"),
        json!({ "status": "INACTIVE" }),
    )
    .await;

    let user = users.find("member-1").await.unwrap();
    assert_eq!(user.status, UserStatus::Inactive);
}
