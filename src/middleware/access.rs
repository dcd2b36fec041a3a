//! Access guards for route groups
//!
//! `require_role` / `require_permission` resolve the caller's effective
//! identity once, check it against an [`AccessRequirement`] and attach it to
//! the request for handlers. A guard nested inside another reuses the
//! identity the outer guard attached.

use crate::domain::{EffectiveIdentity, Permission, Role, SessionId, UserId};
use crate::error::AppError;
use crate::policy::{self, AccessRequirement};
use crate::state::HasServices;
use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{request::Parts, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;

/// Guard state: the application plus what the route group demands
#[derive(Clone)]
pub struct AccessGuard<S> {
    state: S,
    requirement: AccessRequirement,
}

impl<S: HasServices> AccessGuard<S> {
    pub fn new(state: S, requirement: AccessRequirement) -> Self {
        Self { state, requirement }
    }

    pub fn authenticated(state: S) -> Self {
        Self::new(state, AccessRequirement::Authenticated)
    }

    pub fn require_role(state: S, min_role: Role) -> Self {
        Self::new(state, AccessRequirement::Role(min_role))
    }

    pub fn require_permission(state: S, permission: Permission) -> Self {
        Self::new(state, AccessRequirement::Permission(permission))
    }
}

/// The session id carried by the request cookie, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentSession(pub Option<SessionId>);

pub fn principal_id(headers: &HeaderMap, header_name: &str) -> Option<UserId> {
    headers
        .get(header_name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(UserId::from)
}

pub fn session_id(headers: &HeaderMap, cookie_name: &str) -> Option<SessionId> {
    CookieJar::from_headers(headers)
        .get(cookie_name)
        .map(|cookie| cookie.value().trim())
        .filter(|v| !v.is_empty())
        .map(SessionId::from)
}

pub async fn access_guard_middleware<S: HasServices>(
    State(guard): State<AccessGuard<S>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let auth = &guard.state.config().auth;
    let session = session_id(request.headers(), &auth.session_cookie);

    let identity = match request.extensions().get::<EffectiveIdentity>() {
        Some(identity) => identity.clone(),
        None => {
            let principal = principal_id(request.headers(), &auth.principal_header);
            match guard
                .state
                .access_service()
                .authenticate(principal.as_ref(), session.as_ref())
                .await
            {
                Ok(identity) => identity,
                Err(e) => return e.into_response(),
            }
        }
    };

    if let Err(e) = policy::enforce(&identity, guard.requirement) {
        return e.into_response();
    }

    let extensions = request.extensions_mut();
    extensions.insert(identity);
    extensions.insert(CurrentSession(session));
    next.run(request).await
}

/// Extractor for the identity attached by [`access_guard_middleware`].
///
/// A handler mounted without a guard gets `Unauthenticated`.
#[derive(Debug, Clone)]
pub struct Effective(pub EffectiveIdentity);

impl<S: Send + Sync> FromRequestParts<S> for Effective {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<EffectiveIdentity>()
            .cloned()
            .map(Effective)
            .ok_or_else(|| AppError::Unauthenticated("No identity on request".to_string()))
    }
}

impl<S: Send + Sync> FromRequestParts<S> for CurrentSession {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<CurrentSession>()
            .cloned()
            .unwrap_or(CurrentSession(None)))
    }
}
