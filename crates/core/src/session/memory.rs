use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use super::{ConversationSession, SessionStore, SessionStoreError};

pub const DEFAULT_SESSION_TTL_SECS: u64 = 1800;
const MAX_SESSION_TTL_SECS: i64 = 7 * 24 * 3600;

pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, ConversationSession>>,
    ttl: Duration,
}

impl InMemorySessionStore {
    pub fn new(ttl_secs: u64) -> Self {
        let ttl_secs = i64::try_from(ttl_secs).unwrap_or(i64::MAX).min(MAX_SESSION_TTL_SECS);
        Self { sessions: RwLock::new(HashMap::new()), ttl: Duration::seconds(ttl_secs) }
    }

    fn is_expired(&self, session: &ConversationSession, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(session.updated_at) > self.ttl
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL_SECS)
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(
        &self,
        requester_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ConversationSession>, SessionStoreError> {
        {
            let sessions = self.sessions.read().await;
            match sessions.get(requester_id) {
                None => return Ok(None),
                Some(session) if !self.is_expired(session, now) => {
                    return Ok(Some(session.clone()))
                }
                Some(_) => {}
            }
        }

        let mut sessions = self.sessions.write().await;
        if sessions.get(requester_id).is_some_and(|session| self.is_expired(session, now)) {
            sessions.remove(requester_id);
        }
        Ok(None)
    }

    async fn put(&self, session: ConversationSession) -> Result<(), SessionStoreError> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.requester_id.clone(), session);
        Ok(())
    }

    async fn delete(&self, requester_id: &str) -> Result<bool, SessionStoreError> {
        let mut sessions = self.sessions.write().await;
        Ok(sessions.remove(requester_id).is_some())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, SessionStoreError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !self.is_expired(session, now));
        Ok(before - sessions.len())
    }

    async fn len(&self) -> Result<usize, SessionStoreError> {
        Ok(self.sessions.read().await.len())
    }
}
