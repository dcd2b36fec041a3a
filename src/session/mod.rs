//! Session state store
//!
//! The only persistence for view-as contexts. Sessions are keyed by the opaque
//! id carried in the session cookie and hold arbitrary string values. Each
//! operation is atomic with respect to the others on the same session.

mod memory;
mod redis_store;

pub use memory::InMemorySessionStore;
pub use redis_store::RedisSessionStore;

use crate::domain::SessionId;
use crate::error::Result;
use async_trait::async_trait;

/// Session key prefixes and well-known keys
pub mod keys {
    pub const SESSION_PREFIX: &str = "flock:session";
    pub const VIEW_AS: &str = "view_as";
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, session: &SessionId, key: &str) -> Result<Option<String>>;

    /// Write a value and refresh the session lifetime
    async fn set(&self, session: &SessionId, key: &str, value: String) -> Result<()>;

    /// Idempotent
    async fn delete(&self, session: &SessionId, key: &str) -> Result<()>;

    /// Delete `key` only while it still holds `expected`; returns whether it did.
    async fn compare_and_delete(&self, session: &SessionId, key: &str, expected: &str)
        -> Result<bool>;

    /// Drop the whole session
    async fn destroy(&self, session: &SessionId) -> Result<()>;

    async fn ping(&self) -> Result<()>;
}
