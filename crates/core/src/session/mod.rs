//! Per-requester conversation sessions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::flows::{ConversationState, ConversationStep};

pub mod locks;
pub mod memory;

pub use locks::RequesterLocks;
pub use memory::InMemorySessionStore;

#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSession {
    pub requester_id: String,
    pub state: ConversationState,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConversationSession {
    pub fn new(
        requester_id: impl Into<String>,
        state: ConversationState,
        now: DateTime<Utc>,
    ) -> Self {
        Self { requester_id: requester_id.into(), state, started_at: now, updated_at: now }
    }

    pub fn current_step(&self) -> ConversationStep {
        self.state.step
    }

    pub fn is_single_position(&self) -> Option<bool> {
        self.state.answers.is_single_position()
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

/// Storage for in-progress sessions, keyed by requester id. Callers hold the
/// requester's lock from [`RequesterLocks`] across a get/put pair.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Live session for `requester_id`; expired sessions read as absent.
    async fn get(
        &self,
        requester_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ConversationSession>, SessionStoreError>;
    async fn put(&self, session: ConversationSession) -> Result<(), SessionStoreError>;
    /// Returns whether a session was removed.
    async fn delete(&self, requester_id: &str) -> Result<bool, SessionStoreError>;
    /// Drops every session idle past the TTL; returns how many were dropped.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, SessionStoreError>;
    async fn len(&self) -> Result<usize, SessionStoreError>;
}
