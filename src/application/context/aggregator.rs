//! Aggregates a user's memory into a snapshot for the conversational agent.
//!
//! Each category is fetched independently and lands in its own result slot:
//! a failing category degrades to `CategorySection::Failed` while the others
//! still load. The aggregator keeps no state between calls.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{SessionId, UserId};
use crate::domain::memory::{
    BreakthroughMoment, ContextEntry, ConversationEntry, SessionTheme, SpeakerRole,
    StageProgression, UserProfile,
};
use crate::ports::{HistoryQuery, MemoryStore};

use super::themes::detect_themes;

/// Which memory categories a tool call wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextType {
    Conversation,
    Profile,
    Stages,
    Session,
    #[default]
    All,
}

impl ContextType {
    fn wants_conversation(&self) -> bool {
        matches!(self, ContextType::Conversation | ContextType::All)
    }

    fn wants_profile(&self) -> bool {
        matches!(self, ContextType::Profile | ContextType::All)
    }

    fn wants_stages(&self) -> bool {
        matches!(self, ContextType::Stages | ContextType::All)
    }

    fn wants_session(&self) -> bool {
        matches!(self, ContextType::Session | ContextType::All)
    }
}

/// Input for one aggregation call.
#[derive(Debug, Clone)]
pub struct ContextRequest {
    pub user_id: UserId,
    pub context_type: ContextType,
    pub session_id: Option<SessionId>,
    pub limit: usize,
}

impl ContextRequest {
    /// Default number of items per category.
    pub const DEFAULT_LIMIT: usize = 10;

    /// Creates a request for every category with the default limit.
    pub fn all(user_id: UserId) -> Self {
        Self {
            user_id,
            context_type: ContextType::All,
            session_id: None,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

/// Per-category result slot. A category either loaded (data plus a derived
/// summary line) or failed with a reason; one failure never hides the others.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CategorySection<T> {
    Loaded { data: T, summary: String },
    Failed { reason: String },
}

impl<T> CategorySection<T> {
    pub fn is_loaded(&self) -> bool {
        matches!(self, CategorySection::Loaded { .. })
    }

    /// Summary line for loaded sections, the failure reason otherwise.
    pub fn summary_line(&self) -> &str {
        match self {
            CategorySection::Loaded { summary, .. } => summary,
            CategorySection::Failed { reason } => reason,
        }
    }
}

/// Session-scoped sub-records bundled into one category.
#[derive(Debug, Clone, Serialize)]
pub struct SessionData {
    pub stages: Vec<StageProgression>,
    pub contexts: Vec<ContextEntry>,
    pub breakthroughs: Vec<BreakthroughMoment>,
    pub themes: Vec<SessionTheme>,
}

/// The aggregated snapshot returned to the AI platform.
#[derive(Debug, Clone, Serialize)]
pub struct ContextSnapshot {
    pub user_id: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation: Option<CategorySection<Vec<ConversationEntry>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<CategorySection<Option<UserProfile>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stages: Option<CategorySection<Vec<StageProgression>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<CategorySection<SessionData>>,
    pub instructions: Vec<String>,
}

/// Stateless aggregation service over the storage gateway.
#[derive(Clone)]
pub struct ContextAggregator {
    store: Arc<dyn MemoryStore>,
}

impl ContextAggregator {
    pub fn new(store: Arc<dyn MemoryStore>) -> Self {
        Self { store }
    }

    /// Builds a snapshot for the requested categories. Never fails as a
    /// whole; failures are confined to their category slot.
    pub async fn aggregate(&self, request: ContextRequest) -> ContextSnapshot {
        let query = HistoryQuery::with_limit(request.limit);
        let user_id = &request.user_id;

        let conversation = if request.context_type.wants_conversation() {
            Some(self.load_conversation(user_id, &query).await)
        } else {
            None
        };

        let profile = if request.context_type.wants_profile() {
            Some(self.load_profile(user_id).await)
        } else {
            None
        };

        let stages = if request.context_type.wants_stages() {
            Some(self.load_stages(user_id, &query).await)
        } else {
            None
        };

        let session = if request.context_type.wants_session() {
            match (&request.session_id, request.context_type) {
                (Some(session_id), _) => {
                    Some(self.load_session(user_id, session_id, &query).await)
                }
                // `all` without a session id simply skips the session slot;
                // an explicit `session` request without one is a failure.
                (None, ContextType::Session) => Some(CategorySection::Failed {
                    reason: "No session_id provided for session context".to_string(),
                }),
                (None, _) => None,
            }
        } else {
            None
        };

        let instructions = build_instructions(&conversation, &profile, &stages, &session);

        ContextSnapshot {
            user_id: request.user_id,
            conversation,
            profile,
            stages,
            session,
            instructions,
        }
    }

    async fn load_conversation(
        &self,
        user_id: &UserId,
        query: &HistoryQuery,
    ) -> CategorySection<Vec<ConversationEntry>> {
        match self.store.conversation_history(user_id, query).await {
            Ok(entries) => {
                let summary = summarize_conversation(&entries);
                CategorySection::Loaded {
                    data: entries,
                    summary,
                }
            }
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "conversation lookup failed");
                CategorySection::Failed {
                    reason: format!("Conversation history unavailable: {e}"),
                }
            }
        }
    }

    async fn load_profile(&self, user_id: &UserId) -> CategorySection<Option<UserProfile>> {
        match self.store.fetch_profile(user_id).await {
            Ok(profile) => {
                let summary = summarize_profile(profile.as_ref());
                CategorySection::Loaded {
                    data: profile,
                    summary,
                }
            }
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "profile lookup failed");
                CategorySection::Failed {
                    reason: format!("Profile unavailable: {e}"),
                }
            }
        }
    }

    async fn load_stages(
        &self,
        user_id: &UserId,
        query: &HistoryQuery,
    ) -> CategorySection<Vec<StageProgression>> {
        match self.store.stage_history(user_id, query).await {
            Ok(stages) => {
                let summary = summarize_stages(&stages);
                CategorySection::Loaded {
                    data: stages,
                    summary,
                }
            }
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "stage lookup failed");
                CategorySection::Failed {
                    reason: format!("Stage history unavailable: {e}"),
                }
            }
        }
    }

    async fn load_session(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
        query: &HistoryQuery,
    ) -> CategorySection<SessionData> {
        let scoped = HistoryQuery::with_limit(query.limit).for_session(session_id.clone());

        let stages = self.store.stage_history(user_id, &scoped).await;
        let contexts = self.store.context_history(user_id, &scoped).await;
        let breakthroughs = self
            .store
            .breakthroughs_for_session(session_id, query.limit)
            .await;
        let themes = self.store.themes_for_session(session_id, query.limit).await;

        match (stages, contexts, breakthroughs, themes) {
            (Ok(stages), Ok(contexts), Ok(breakthroughs), Ok(themes)) => {
                let data = SessionData {
                    stages,
                    contexts,
                    breakthroughs,
                    themes,
                };
                let summary = summarize_session(&data);
                CategorySection::Loaded { data, summary }
            }
            (stages, contexts, breakthroughs, themes) => {
                let first_error = [
                    stages.err().map(|e| e.to_string()),
                    contexts.err().map(|e| e.to_string()),
                    breakthroughs.err().map(|e| e.to_string()),
                    themes.err().map(|e| e.to_string()),
                ]
                .into_iter()
                .flatten()
                .next()
                .unwrap_or_else(|| "unknown".to_string());
                tracing::warn!(
                    user_id = %user_id,
                    session_id = %session_id,
                    error = %first_error,
                    "session lookup failed"
                );
                CategorySection::Failed {
                    reason: format!("Session data unavailable: {first_error}"),
                }
            }
        }
    }
}

fn summarize_conversation(entries: &[ConversationEntry]) -> String {
    if entries.is_empty() {
        return "No conversation history yet.".to_string();
    }
    let user_turns = entries
        .iter()
        .filter(|e| e.role == SpeakerRole::User);
    let themes = detect_themes(user_turns.map(|e| e.content.as_str()));
    if themes.is_empty() {
        format!("{} recent conversation turns.", entries.len())
    } else {
        format!(
            "{} recent conversation turns; recurring themes: {}.",
            entries.len(),
            themes.join(", ")
        )
    }
}

fn summarize_profile(profile: Option<&UserProfile>) -> String {
    match profile {
        None => "No profile on record.".to_string(),
        Some(p) => {
            let name = p.display_name.as_deref().unwrap_or("unnamed user");
            let stage = p.current_stage.as_deref().unwrap_or("no recorded stage");
            format!(
                "{name}; {count} session(s); current stage: {stage}.",
                count = p.session_count
            )
        }
    }
}

fn summarize_stages(stages: &[StageProgression]) -> String {
    match stages.first() {
        None => "No stage progressions recorded.".to_string(),
        Some(latest) => format!(
            "{} stage transition(s); most recent: '{}'.",
            stages.len(),
            latest.stage
        ),
    }
}

fn summarize_session(data: &SessionData) -> String {
    format!(
        "Session has {} stage transition(s), {} context entr(ies), {} breakthrough(s), {} theme(s).",
        data.stages.len(),
        data.contexts.len(),
        data.breakthroughs.len(),
        data.themes.len()
    )
}

/// Derives the flat instruction list the agent receives alongside the data.
fn build_instructions(
    conversation: &Option<CategorySection<Vec<ConversationEntry>>>,
    profile: &Option<CategorySection<Option<UserProfile>>>,
    stages: &Option<CategorySection<Vec<StageProgression>>>,
    session: &Option<CategorySection<SessionData>>,
) -> Vec<String> {
    let mut instructions = Vec::new();

    if let Some(CategorySection::Loaded {
        data: Some(profile),
        ..
    }) = profile
    {
        if let Some(name) = &profile.display_name {
            instructions.push(format!("Address the user by name: {name}."));
        }
        if let Some(stage) = &profile.current_stage {
            instructions.push(format!("Continue from stage '{stage}'."));
        }
        if !profile.recurring_themes.is_empty() {
            instructions.push(format!(
                "Known recurring themes: {}.",
                profile.recurring_themes.join(", ")
            ));
        }
    }

    if let Some(CategorySection::Loaded { data, .. }) = conversation {
        if data.is_empty() {
            instructions
                .push("This appears to be a new user; begin with a gentle introduction.".into());
        } else {
            let themes = detect_themes(
                data.iter()
                    .filter(|e| e.role == SpeakerRole::User)
                    .map(|e| e.content.as_str()),
            );
            if !themes.is_empty() {
                instructions.push(format!(
                    "Recent conversations touched on: {}.",
                    themes.join(", ")
                ));
            }
        }
    }

    if let Some(CategorySection::Loaded { data, .. }) = stages {
        if let Some(latest) = data.first() {
            instructions.push(format!(
                "The most recent stage transition was to '{}'.",
                latest.stage
            ));
        }
    }

    if let Some(CategorySection::Loaded { data, .. }) = session {
        if let Some(latest) = data.breakthroughs.first() {
            instructions.push(format!(
                "Acknowledge the recent breakthrough: {}.",
                latest.description
            ));
        }
    }

    if instructions.is_empty() {
        instructions.push("No prior context available; treat this as a first session.".into());
    }

    instructions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemoryStore;
    use crate::domain::memory::{ConversationEntry, ProfilePatch, SpeakerRole};

    fn user() -> UserId {
        UserId::new("user-1").unwrap()
    }

    #[tokio::test]
    async fn empty_user_gets_default_sections() {
        let aggregator = ContextAggregator::new(Arc::new(InMemoryStore::new()));
        let snapshot = aggregator.aggregate(ContextRequest::all(user())).await;

        let conversation = snapshot.conversation.unwrap();
        assert!(conversation.is_loaded());
        assert_eq!(conversation.summary_line(), "No conversation history yet.");

        let profile = snapshot.profile.unwrap();
        assert!(profile.is_loaded());
        assert_eq!(profile.summary_line(), "No profile on record.");

        assert!(snapshot.stages.unwrap().is_loaded());
        // No session id: the session slot is skipped, not failed.
        assert!(snapshot.session.is_none());
    }

    #[tokio::test]
    async fn profile_drives_instructions() {
        let store = Arc::new(InMemoryStore::new());
        store
            .upsert_profile(
                &user(),
                ProfilePatch {
                    display_name: Some("Ada".into()),
                    current_stage: Some("awareness".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        store
            .store_conversation_entry(ConversationEntry::new(
                user(),
                SpeakerRole::User,
                "my job has been overwhelming",
                None,
            ))
            .await
            .unwrap();

        let aggregator = ContextAggregator::new(store);
        let snapshot = aggregator.aggregate(ContextRequest::all(user())).await;

        let instructions = snapshot.instructions.join("\n");
        assert!(instructions.contains("Address the user by name: Ada."));
        assert!(instructions.contains("Continue from stage 'awareness'."));
        assert!(instructions.contains("work"));
    }

    #[tokio::test]
    async fn session_request_without_id_fails_that_slot_only() {
        let aggregator = ContextAggregator::new(Arc::new(InMemoryStore::new()));
        let snapshot = aggregator
            .aggregate(ContextRequest {
                user_id: user(),
                context_type: ContextType::Session,
                session_id: None,
                limit: 10,
            })
            .await;

        assert!(snapshot.conversation.is_none());
        let session = snapshot.session.unwrap();
        assert!(!session.is_loaded());
        assert!(session.summary_line().contains("session_id"));
    }

    #[tokio::test]
    async fn single_category_request_skips_the_rest() {
        let aggregator = ContextAggregator::new(Arc::new(InMemoryStore::new()));
        let snapshot = aggregator
            .aggregate(ContextRequest {
                user_id: user(),
                context_type: ContextType::Profile,
                session_id: None,
                limit: 10,
            })
            .await;

        assert!(snapshot.profile.is_some());
        assert!(snapshot.conversation.is_none());
        assert!(snapshot.stages.is_none());
        assert!(snapshot.session.is_none());
    }
}
