//! "View as" control for top-role callers
//!
//! Mounted behind an authenticated-only guard: granting checks the real role,
//! and a caller currently viewing as a low role must still be able to return
//! to their own identity.

use crate::api::SuccessResponse;
use crate::domain::{
    EffectiveIdentity, ImpersonationContext, Permission, Principal, Role, TenantId,
};
use crate::error::{AppError, Result};
use crate::middleware::{CurrentSession, Effective};
use crate::state::HasServices;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct GrantViewAsRequest {
    pub role: Role,
    #[validate(length(min = 1, max = 64))]
    pub tenant_id: Option<String>,
}

/// The caller's real identity next to the identity decisions are made with
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewContextResponse {
    pub real: Principal,
    pub role: Role,
    pub tenant_id: Option<TenantId>,
    pub impersonating: bool,
    pub view_as: Option<ImpersonationContext>,
    pub capabilities: Vec<Permission>,
}

impl From<&EffectiveIdentity> for ViewContextResponse {
    fn from(identity: &EffectiveIdentity) -> Self {
        let mut capabilities: Vec<Permission> = identity.capabilities().iter().copied().collect();
        capabilities.sort_by_key(|permission| permission.as_str());
        Self {
            real: identity.real.clone(),
            role: identity.role,
            tenant_id: identity.tenant_id.clone(),
            impersonating: identity.is_impersonating(),
            view_as: identity.view_as.clone(),
            capabilities,
        }
    }
}

/// GET /api/v1/view-as
pub async fn current(Effective(identity): Effective) -> Json<SuccessResponse<ViewContextResponse>> {
    Json(SuccessResponse::new(ViewContextResponse::from(&identity)))
}

/// POST /api/v1/view-as
pub async fn grant<S: HasServices>(
    State(state): State<S>,
    Effective(identity): Effective,
    CurrentSession(session): CurrentSession,
    Json(input): Json<GrantViewAsRequest>,
) -> Result<Json<SuccessResponse<ViewContextResponse>>> {
    state
        .impersonation_service()
        .authorize_grant(&identity.real)?;
    input.validate()?;
    let session = session.ok_or_else(|| {
        AppError::BadRequest("A session is required to view as another role".to_string())
    })?;

    let context = state
        .impersonation_service()
        .grant(
            &session,
            &identity.real,
            input.role,
            input.tenant_id.map(TenantId::from),
        )
        .await?;

    let effective = EffectiveIdentity::impersonating(identity.real, context);
    Ok(Json(SuccessResponse::new(ViewContextResponse::from(
        &effective,
    ))))
}

/// DELETE /api/v1/view-as: return to the real identity
pub async fn clear<S: HasServices>(
    State(state): State<S>,
    Effective(identity): Effective,
    CurrentSession(session): CurrentSession,
) -> Result<Json<SuccessResponse<ViewContextResponse>>> {
    if let Some(session) = session {
        state.impersonation_service().clear(&session).await?;
        info!(
            user_id = %identity.user_id(),
            real_role = %identity.real.role,
            was_viewing_as = ?identity.view_as.as_ref().map(|context| context.effective_role),
            "Returned to real identity"
        );
    }

    let real = EffectiveIdentity::from_principal(identity.real);
    Ok(Json(SuccessResponse::new(ViewContextResponse::from(&real))))
}
