//! HTTP middleware for Flock Core
//!
//! - Access guards (`requireRole` / `requirePermission`) and the extractors
//!   handlers use to read the resolved identity
//! - Error response normalization

pub mod access;
pub mod error_response;

pub use access::{access_guard_middleware, AccessGuard, CurrentSession, Effective};
pub use error_response::normalize_error_response;
