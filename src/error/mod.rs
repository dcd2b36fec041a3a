//! Unified error handling for Flock Core

use crate::domain::{Permission, Role};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// No resolvable identity for the request
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Forbidden: role {actual} is below required role {required}")]
    InsufficientRole { required: Role, actual: Role },

    #[error("Forbidden: role {role} lacks permission {required}")]
    MissingPermission { required: Permission, role: Role },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A top-role caller reached a tenant-scoped operation with no tenant
    #[error("Tenant context required")]
    TenantRequired,

    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Unknown permission: {0}")]
    UnknownPermission(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Whether the failure came from storage I/O and may be retried by the caller.
    ///
    /// Authorization failures are never transient.
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::Database(_) | AppError::Redis(_))
    }

    /// True for every variant that denies access to an identified caller.
    pub fn is_forbidden(&self) -> bool {
        matches!(
            self,
            AppError::InsufficientRole { .. }
                | AppError::MissingPermission { .. }
                | AppError::Forbidden(_)
        )
    }
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    required_role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    actual_role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    required_permission: Option<Permission>,
}

impl ErrorResponse {
    fn new(error: &str, reason: &str, message: String) -> Self {
        Self {
            error: error.to_string(),
            message,
            reason: reason.to_string(),
            required_role: None,
            actual_role: None,
            required_permission: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::Unauthenticated(msg) => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse::new("unauthenticated", "unauthenticated", msg.clone()),
            ),
            AppError::InsufficientRole { required, actual } => {
                let mut body = ErrorResponse::new(
                    "forbidden",
                    "insufficient_role",
                    format!("Role {} or higher is required", required),
                );
                body.required_role = Some(*required);
                body.actual_role = Some(*actual);
                (StatusCode::FORBIDDEN, body)
            }
            AppError::MissingPermission { required, .. } => {
                let mut body = ErrorResponse::new(
                    "forbidden",
                    "missing_permission",
                    format!("Permission {} is required", required),
                );
                body.required_permission = Some(*required);
                (StatusCode::FORBIDDEN, body)
            }
            AppError::Forbidden(msg) => (
                StatusCode::FORBIDDEN,
                ErrorResponse::new("forbidden", "forbidden", msg.clone()),
            ),
            AppError::TenantRequired => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new(
                    "tenant_required",
                    "no_tenant_context",
                    "A tenant must be selected for this operation".to_string(),
                ),
            ),
            AppError::UnknownRole(token) | AppError::UnknownPermission(token) => {
                tracing::error!(token = %token, "Access rule references an unknown token");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new(
                        "configuration_error",
                        "access_rule_misconfigured",
                        "Access rules are misconfigured".to_string(),
                    ),
                )
            }
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorResponse::new("not_found", "not_found", msg.clone()),
            ),
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("bad_request", "bad_request", msg.clone()),
            ),
            AppError::Validation(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorResponse::new("validation", "validation", msg.clone()),
            ),
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new(
                        "database_error",
                        "storage_unavailable",
                        "A database error occurred".to_string(),
                    ),
                )
            }
            AppError::Redis(e) => {
                tracing::error!("Redis error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new(
                        "session_error",
                        "storage_unavailable",
                        "A session store error occurred".to_string(),
                    ),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new(
                        "internal_error",
                        "internal_error",
                        "An internal error occurred".to_string(),
                    ),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

// Conversion from validation errors
impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}
