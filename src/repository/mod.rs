//! Data access layer
//!
//! Narrow repository traits over the surrounding application's store. Every
//! method is assumed atomic at the row level; the MySQL implementations are
//! thin `sqlx` wrappers.

pub mod activity;
pub mod tenant;
pub mod user;

pub use activity::{ActivityRepository, ActivityRepositoryImpl};
pub use tenant::{TenantRepository, TenantRepositoryImpl};
pub use user::{UserRepository, UserRepositoryImpl};
