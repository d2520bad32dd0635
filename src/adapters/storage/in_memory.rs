//! In-memory implementation of the storage gateway.
//!
//! Backs the integration tests and local development without a database.
//! All collections live behind a single mutex; contention is irrelevant at
//! test scale.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::foundation::{SessionId, UserId};
use crate::domain::memory::{
    BreakthroughMoment, ContextEntry, ConversationEntry, ProfilePatch, SessionTheme,
    StageProgression, UserProfile,
};
use crate::ports::{HistoryQuery, MemoryStore, StoreError};

#[derive(Default)]
struct Collections {
    profiles: HashMap<UserId, UserProfile>,
    conversations: Vec<ConversationEntry>,
    stages: Vec<StageProgression>,
    contexts: Vec<ContextEntry>,
    breakthroughs: Vec<BreakthroughMoment>,
    themes: Vec<SessionTheme>,
}

/// Mutex-backed storage gateway.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Collections>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Collections> {
        // A poisoned mutex only happens after a panic in test code; recover
        // the guard rather than cascading the panic.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Returns up to `limit` items matching `filter`, most recent first.
fn recent<T: Clone>(items: &[T], filter: impl Fn(&T) -> bool, limit: usize) -> Vec<T> {
    let mut matched: Vec<T> = items.iter().filter(|i| filter(i)).cloned().collect();
    matched.reverse();
    matched.truncate(limit);
    matched
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    async fn store_conversation_entry(
        &self,
        entry: ConversationEntry,
    ) -> Result<ConversationEntry, StoreError> {
        self.lock().conversations.push(entry.clone());
        Ok(entry)
    }

    async fn conversation_history(
        &self,
        user_id: &UserId,
        query: &HistoryQuery,
    ) -> Result<Vec<ConversationEntry>, StoreError> {
        let guard = self.lock();
        Ok(recent(
            &guard.conversations,
            |e| &e.user_id == user_id,
            query.limit,
        ))
    }

    async fn upsert_profile(
        &self,
        user_id: &UserId,
        patch: ProfilePatch,
    ) -> Result<UserProfile, StoreError> {
        let mut guard = self.lock();
        let profile = guard
            .profiles
            .entry(user_id.clone())
            .and_modify(|p| p.apply(patch.clone()))
            .or_insert_with(|| UserProfile::from_patch(user_id.clone(), patch));
        Ok(profile.clone())
    }

    async fn fetch_profile(&self, user_id: &UserId) -> Result<Option<UserProfile>, StoreError> {
        Ok(self.lock().profiles.get(user_id).cloned())
    }

    async fn record_stage(
        &self,
        progression: StageProgression,
    ) -> Result<StageProgression, StoreError> {
        self.lock().stages.push(progression.clone());
        Ok(progression)
    }

    async fn stage_history(
        &self,
        user_id: &UserId,
        query: &HistoryQuery,
    ) -> Result<Vec<StageProgression>, StoreError> {
        let guard = self.lock();
        Ok(recent(
            &guard.stages,
            |s| {
                &s.user_id == user_id
                    && query
                        .session_id
                        .as_ref()
                        .map_or(true, |sid| s.session_id.as_ref() == Some(sid))
            },
            query.limit,
        ))
    }

    async fn store_context(&self, entry: ContextEntry) -> Result<ContextEntry, StoreError> {
        self.lock().contexts.push(entry.clone());
        Ok(entry)
    }

    async fn context_history(
        &self,
        user_id: &UserId,
        query: &HistoryQuery,
    ) -> Result<Vec<ContextEntry>, StoreError> {
        let guard = self.lock();
        Ok(recent(
            &guard.contexts,
            |c| {
                &c.user_id == user_id
                    && query
                        .session_id
                        .as_ref()
                        .map_or(true, |sid| c.session_id.as_ref() == Some(sid))
            },
            query.limit,
        ))
    }

    async fn record_breakthrough(
        &self,
        moment: BreakthroughMoment,
    ) -> Result<BreakthroughMoment, StoreError> {
        self.lock().breakthroughs.push(moment.clone());
        Ok(moment)
    }

    async fn breakthroughs_for_session(
        &self,
        session_id: &SessionId,
        limit: usize,
    ) -> Result<Vec<BreakthroughMoment>, StoreError> {
        let guard = self.lock();
        Ok(recent(
            &guard.breakthroughs,
            |b| &b.session_id == session_id,
            limit,
        ))
    }

    async fn record_theme(&self, theme: SessionTheme) -> Result<SessionTheme, StoreError> {
        self.lock().themes.push(theme.clone());
        Ok(theme)
    }

    async fn themes_for_session(
        &self,
        session_id: &SessionId,
        limit: usize,
    ) -> Result<Vec<SessionTheme>, StoreError> {
        let guard = self.lock();
        Ok(recent(&guard.themes, |t| &t.session_id == session_id, limit))
    }

    async fn erase_user(&self, user_id: &UserId) -> Result<(), StoreError> {
        let mut guard = self.lock();
        guard.profiles.remove(user_id);
        guard.conversations.retain(|e| &e.user_id != user_id);
        guard.stages.retain(|s| &s.user_id != user_id);
        guard.contexts.retain(|c| &c.user_id != user_id);
        guard.breakthroughs.retain(|b| &b.user_id != user_id);
        guard.themes.retain(|t| &t.user_id != user_id);
        Ok(())
    }
}
