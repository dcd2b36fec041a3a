//! Redis-backed session store
//!
//! Each session is one Redis hash, `flock:session:<id>`, whose TTL is
//! refreshed on every write. Multi-step operations run as a MULTI pipeline or
//! a Lua script so they stay atomic against concurrent requests.

use super::{keys, SessionStore};
use crate::config::RedisConfig;
use crate::domain::SessionId;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Script};
use std::time::Duration;

const COMPARE_AND_DELETE: &str = r#"
if redis.call('HGET', KEYS[1], ARGV[1]) == ARGV[2] then
    return redis.call('HDEL', KEYS[1], ARGV[1])
end
return 0
"#;

#[derive(Clone)]
pub struct RedisSessionStore {
    conn: ConnectionManager,
    ttl: Duration,
}

impl RedisSessionStore {
    pub async fn new(config: &RedisConfig, ttl: Duration) -> Result<Self> {
        let client = redis::Client::open(config.url.as_str()).map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Failed to create Redis client: {}", e))
        })?;

        let conn = ConnectionManager::new(client).await.map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Failed to connect to Redis: {}", e))
        })?;

        Ok(Self { conn, ttl })
    }

    fn session_key(session: &SessionId) -> String {
        format!("{}:{}", keys::SESSION_PREFIX, session)
    }

    fn ttl_secs(&self) -> i64 {
        self.ttl.as_secs().max(1) as i64
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn get(&self, session: &SessionId, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.hget(Self::session_key(session), key).await?;
        Ok(value)
    }

    async fn set(&self, session: &SessionId, key: &str, value: String) -> Result<()> {
        let mut conn = self.conn.clone();
        let session_key = Self::session_key(session);
        redis::pipe()
            .atomic()
            .hset(&session_key, key, value)
            .ignore()
            .expire(&session_key, self.ttl_secs())
            .ignore()
            .query_async::<()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn delete(&self, session: &SessionId, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: i64 = conn.hdel(Self::session_key(session), key).await?;
        Ok(())
    }

    async fn compare_and_delete(
        &self,
        session: &SessionId,
        key: &str,
        expected: &str,
    ) -> Result<bool> {
        let mut conn = self.conn.clone();
        let deleted: i64 = Script::new(COMPARE_AND_DELETE)
            .key(Self::session_key(session))
            .arg(key)
            .arg(expected)
            .invoke_async(&mut conn)
            .await?;
        Ok(deleted > 0)
    }

    async fn destroy(&self, session: &SessionId) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: i64 = conn.del(Self::session_key(session)).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
