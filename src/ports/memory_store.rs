//! Storage gateway port.
//!
//! One method per (entity, operation) pair. Implementations convert every
//! underlying failure into a [`StoreError`] - nothing panics past this
//! boundary. There are no retries; the only multi-statement operation is
//! the best-effort batch delete in [`MemoryStore::erase_user`].

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::{SessionId, UserId};
use crate::domain::memory::{
    BreakthroughMoment, ContextEntry, ConversationEntry, ProfilePatch, SessionTheme,
    StageProgression, UserProfile,
};

/// Storage failures surfaced by gateway implementations.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Bounds for a history read. Results are always most-recent-first.
#[derive(Debug, Clone)]
pub struct HistoryQuery {
    pub limit: usize,
    pub session_id: Option<SessionId>,
}

impl HistoryQuery {
    /// Maximum rows a single read may return.
    pub const MAX_LIMIT: usize = 50;

    /// Default limit for HTTP history reads.
    pub const DEFAULT_LIMIT: usize = 20;

    /// Creates a query with the limit clamped to 1..=50.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: limit.clamp(1, Self::MAX_LIMIT),
            session_id: None,
        }
    }

    /// Restricts the query to a single session.
    pub fn for_session(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self::with_limit(Self::DEFAULT_LIMIT)
    }
}

/// Storage gateway for all conversational memory collections.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Appends a conversation entry.
    async fn store_conversation_entry(
        &self,
        entry: ConversationEntry,
    ) -> Result<ConversationEntry, StoreError>;

    /// Fetches conversation history, most recent first.
    async fn conversation_history(
        &self,
        user_id: &UserId,
        query: &HistoryQuery,
    ) -> Result<Vec<ConversationEntry>, StoreError>;

    /// Creates the profile on first write, merges the patch thereafter.
    async fn upsert_profile(
        &self,
        user_id: &UserId,
        patch: ProfilePatch,
    ) -> Result<UserProfile, StoreError>;

    /// Fetches a profile, `None` when the user has never written one.
    async fn fetch_profile(&self, user_id: &UserId) -> Result<Option<UserProfile>, StoreError>;

    /// Appends a stage progression, optionally scoped to a session.
    async fn record_stage(
        &self,
        progression: StageProgression,
    ) -> Result<StageProgression, StoreError>;

    /// Fetches stage progressions, most recent first. A session filter in
    /// the query restricts to that session's progressions.
    async fn stage_history(
        &self,
        user_id: &UserId,
        query: &HistoryQuery,
    ) -> Result<Vec<StageProgression>, StoreError>;

    /// Appends a context entry, optionally scoped to a session.
    async fn store_context(&self, entry: ContextEntry) -> Result<ContextEntry, StoreError>;

    /// Fetches context entries, most recent first.
    async fn context_history(
        &self,
        user_id: &UserId,
        query: &HistoryQuery,
    ) -> Result<Vec<ContextEntry>, StoreError>;

    /// Appends a breakthrough moment under a session.
    async fn record_breakthrough(
        &self,
        moment: BreakthroughMoment,
    ) -> Result<BreakthroughMoment, StoreError>;

    /// Fetches breakthrough moments for a session, most recent first.
    async fn breakthroughs_for_session(
        &self,
        session_id: &SessionId,
        limit: usize,
    ) -> Result<Vec<BreakthroughMoment>, StoreError>;

    /// Appends a therapeutic theme under a session.
    async fn record_theme(&self, theme: SessionTheme) -> Result<SessionTheme, StoreError>;

    /// Fetches themes for a session, most recent first.
    async fn themes_for_session(
        &self,
        session_id: &SessionId,
        limit: usize,
    ) -> Result<Vec<SessionTheme>, StoreError>;

    /// Best-effort batch delete of everything stored for a user.
    async fn erase_user(&self, user_id: &UserId) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_is_object_safe() {
        fn _accepts_dyn(_store: &dyn MemoryStore) {}
    }

    #[test]
    fn history_query_clamps_limit() {
        assert_eq!(HistoryQuery::with_limit(0).limit, 1);
        assert_eq!(HistoryQuery::with_limit(10).limit, 10);
        assert_eq!(HistoryQuery::with_limit(500).limit, 50);
    }
}
