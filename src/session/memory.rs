//! In-process session store

use super::SessionStore;
use crate::domain::SessionId;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

struct SessionEntry {
    values: HashMap<String, String>,
    expires_at: Instant,
}

impl SessionEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Session store kept in process memory, one mutex per session.
///
/// A session expires `ttl` after its last write; expired sessions read as
/// empty and are swept by [`InMemorySessionStore::purge_expired`].
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Arc<Mutex<SessionEntry>>>>,
    ttl: Duration,
}

impl InMemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    async fn existing(&self, session: &SessionId) -> Option<Arc<Mutex<SessionEntry>>> {
        self.sessions.read().await.get(session).cloned()
    }

    async fn get_or_create(&self, session: &SessionId) -> Arc<Mutex<SessionEntry>> {
        if let Some(entry) = self.existing(session).await {
            return entry;
        }
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(session.clone())
            .or_insert_with(|| {
                Arc::new(Mutex::new(SessionEntry {
                    values: HashMap::new(),
                    expires_at: Instant::now() + self.ttl,
                }))
            })
            .clone()
    }

    /// Remove every expired session; returns how many were dropped.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        let mut expired = Vec::new();
        for (id, entry) in sessions.iter() {
            // Handles are only cloned under the map lock, so a count above one
            // means a request still holds this session. Leave it for the next sweep.
            if Arc::strong_count(entry) > 1 {
                continue;
            }
            if let Ok(entry) = entry.try_lock() {
                if entry.is_expired(now) {
                    expired.push(id.clone());
                }
            }
        }
        for id in expired {
            sessions.remove(&id);
        }
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, session: &SessionId, key: &str) -> Result<Option<String>> {
        let Some(entry) = self.existing(session).await else {
            return Ok(None);
        };
        let entry = entry.lock().await;
        if entry.is_expired(Instant::now()) {
            return Ok(None);
        }
        Ok(entry.values.get(key).cloned())
    }

    async fn set(&self, session: &SessionId, key: &str, value: String) -> Result<()> {
        let entry = self.get_or_create(session).await;
        let mut entry = entry.lock().await;
        let now = Instant::now();
        if entry.is_expired(now) {
            entry.values.clear();
        }
        entry.values.insert(key.to_string(), value);
        entry.expires_at = now + self.ttl;
        Ok(())
    }

    async fn delete(&self, session: &SessionId, key: &str) -> Result<()> {
        if let Some(entry) = self.existing(session).await {
            entry.lock().await.values.remove(key);
        }
        Ok(())
    }

    async fn compare_and_delete(
        &self,
        session: &SessionId,
        key: &str,
        expected: &str,
    ) -> Result<bool> {
        let Some(entry) = self.existing(session).await else {
            return Ok(false);
        };
        let mut entry = entry.lock().await;
        if entry.values.get(key).map(String::as_str) == Some(expected) {
            entry.values.remove(key);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn destroy(&self, session: &SessionId) -> Result<()> {
        self.sessions.write().await.remove(session);
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
