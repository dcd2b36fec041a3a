//! Flock Core - access-control backend for the Flock church platform
//!
//! This crate provides the role hierarchy, permission table, view-as
//! (impersonation) contexts, tenant scoping and the cross-tenant metrics
//! aggregator, exposed through a REST API.

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod middleware;
pub mod policy;
pub mod repository;
pub mod server;
pub mod service;
pub mod session;
pub mod state;
pub mod telemetry;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};
