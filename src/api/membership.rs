//! Membership and tenant administration endpoints
//!
//! Route groups carry the structural guard; the finer permission and
//! role-exceeds-target checks live in [`crate::service::MembershipService`].

use crate::api::SuccessResponse;
use crate::domain::{MemberSummary, Role, Tenant, TenantId, TenantStatus, UserId, UserStatus};
use crate::error::Result;
use crate::middleware::Effective;
use crate::state::HasServices;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct MembersQuery {
    /// Honoured for the top role only
    #[validate(length(min = 1, max = 64))]
    pub tenant_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct UserStatusRequest {
    pub status: UserStatus,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TransferRequest {
    #[validate(length(min = 1, max = 64))]
    pub tenant_id: String,
}

#[derive(Debug, Deserialize)]
pub struct TenantStatusRequest {
    pub status: TenantStatus,
}

/// GET /api/v1/members?tenant_id=
pub async fn list<S: HasServices>(
    State(state): State<S>,
    Effective(identity): Effective,
    Query(query): Query<MembersQuery>,
) -> Result<Json<SuccessResponse<Vec<MemberSummary>>>> {
    query.validate()?;
    let explicit = query.tenant_id.map(TenantId::from);
    let members = state
        .membership_service()
        .list_members(&identity, explicit.as_ref())
        .await?;
    Ok(Json(SuccessResponse::new(members)))
}

/// PATCH /api/v1/users/{id}/role
pub async fn change_role<S: HasServices>(
    State(state): State<S>,
    Effective(identity): Effective,
    Path(user_id): Path<String>,
    Json(input): Json<ChangeRoleRequest>,
) -> Result<Json<SuccessResponse<MemberSummary>>> {
    let member = state
        .membership_service()
        .change_role(&identity, &UserId::from(user_id), input.role)
        .await?;
    Ok(Json(SuccessResponse::new(member)))
}

/// PATCH /api/v1/users/{id}/status
pub async fn set_user_status<S: HasServices>(
    State(state): State<S>,
    Effective(identity): Effective,
    Path(user_id): Path<String>,
    Json(input): Json<UserStatusRequest>,
) -> Result<Json<SuccessResponse<MemberSummary>>> {
    let member = state
        .membership_service()
        .set_user_status(&identity, &UserId::from(user_id), input.status)
        .await?;
    Ok(Json(SuccessResponse::new(member)))
}

/// POST /api/v1/users/{id}/transfer
pub async fn transfer<S: HasServices>(
    State(state): State<S>,
    Effective(identity): Effective,
    Path(user_id): Path<String>,
    Json(input): Json<TransferRequest>,
) -> Result<Json<SuccessResponse<MemberSummary>>> {
    input.validate()?;
    let member = state
        .membership_service()
        .transfer_tenant(
            &identity,
            &UserId::from(user_id),
            &TenantId::from(input.tenant_id),
        )
        .await?;
    Ok(Json(SuccessResponse::new(member)))
}

/// PATCH /api/v1/tenants/{id}/status
pub async fn set_tenant_status<S: HasServices>(
    State(state): State<S>,
    Effective(identity): Effective,
    Path(tenant_id): Path<String>,
    Json(input): Json<TenantStatusRequest>,
) -> Result<Json<SuccessResponse<Tenant>>> {
    let tenant = state
        .membership_service()
        .set_tenant_status(&identity, &TenantId::from(tenant_id), input.status)
        .await?;
    Ok(Json(SuccessResponse::new(tenant)))
}
