//! Append-only memory records.
//!
//! Every record carries a server-assigned [`EntryId`] and a creation
//! [`Timestamp`]; retrieval is always most-recent-first.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{EntryId, SessionId, Timestamp, UserId, ValidationError};

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeakerRole {
    User,
    Assistant,
}

impl SpeakerRole {
    /// Canonical lowercase name, used for storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            SpeakerRole::User => "user",
            SpeakerRole::Assistant => "assistant",
        }
    }
}

impl fmt::Display for SpeakerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpeakerRole {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(SpeakerRole::User),
            "assistant" => Ok(SpeakerRole::Assistant),
            other => Err(ValidationError::invalid_format(
                "role",
                format!("expected 'user' or 'assistant', got '{other}'"),
            )),
        }
    }
}

/// One turn of conversation between the user and the agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub id: EntryId,
    pub user_id: UserId,
    pub role: SpeakerRole,
    pub content: String,
    pub stage: Option<String>,
    pub created_at: Timestamp,
}

impl ConversationEntry {
    /// Creates a new entry stamped with the current time.
    pub fn new(
        user_id: UserId,
        role: SpeakerRole,
        content: impl Into<String>,
        stage: Option<String>,
    ) -> Self {
        Self {
            id: EntryId::new(),
            user_id,
            role,
            content: content.into(),
            stage,
            created_at: Timestamp::now(),
        }
    }
}

/// A recorded transition into a therapeutic stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageProgression {
    pub id: EntryId,
    pub user_id: UserId,
    pub session_id: Option<SessionId>,
    pub stage: String,
    pub created_at: Timestamp,
}

impl StageProgression {
    pub fn new(user_id: UserId, stage: impl Into<String>, session_id: Option<SessionId>) -> Self {
        Self {
            id: EntryId::new(),
            user_id,
            session_id,
            stage: stage.into(),
            created_at: Timestamp::now(),
        }
    }
}

/// Arbitrary context payload attached to a user, optionally scoped to a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextEntry {
    pub id: EntryId,
    pub user_id: UserId,
    pub session_id: Option<SessionId>,
    pub payload: serde_json::Value,
    pub created_at: Timestamp,
}

impl ContextEntry {
    pub fn new(
        user_id: UserId,
        payload: serde_json::Value,
        session_id: Option<SessionId>,
    ) -> Self {
        Self {
            id: EntryId::new(),
            user_id,
            session_id,
            payload,
            created_at: Timestamp::now(),
        }
    }
}

/// A breakthrough moment observed during a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakthroughMoment {
    pub id: EntryId,
    pub user_id: UserId,
    pub session_id: SessionId,
    pub description: String,
    pub created_at: Timestamp,
}

impl BreakthroughMoment {
    pub fn new(user_id: UserId, session_id: SessionId, description: impl Into<String>) -> Self {
        Self {
            id: EntryId::new(),
            user_id,
            session_id,
            description: description.into(),
            created_at: Timestamp::now(),
        }
    }
}

/// A therapeutic theme surfaced during a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTheme {
    pub id: EntryId,
    pub user_id: UserId,
    pub session_id: SessionId,
    pub theme: String,
    pub created_at: Timestamp,
}

impl SessionTheme {
    pub fn new(user_id: UserId, session_id: SessionId, theme: impl Into<String>) -> Self {
        Self {
            id: EntryId::new(),
            user_id,
            session_id,
            theme: theme.into(),
            created_at: Timestamp::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserId {
        UserId::new("user-1").unwrap()
    }

    #[test]
    fn speaker_role_round_trips() {
        assert_eq!("user".parse::<SpeakerRole>().unwrap(), SpeakerRole::User);
        assert_eq!(
            "assistant".parse::<SpeakerRole>().unwrap(),
            SpeakerRole::Assistant
        );
        assert!("narrator".parse::<SpeakerRole>().is_err());
    }

    #[test]
    fn conversation_entry_gets_id_and_timestamp() {
        let entry = ConversationEntry::new(user(), SpeakerRole::User, "hello", None);
        assert_eq!(entry.content, "hello");
        assert!(entry.stage.is_none());
        // id and created_at are server-assigned on construction
        assert!(!entry.id.to_string().is_empty());
    }

    #[test]
    fn stage_progression_can_be_session_scoped() {
        let session = SessionId::new("sess-1").unwrap();
        let global = StageProgression::new(user(), "grounding", None);
        let scoped = StageProgression::new(user(), "grounding", Some(session.clone()));
        assert!(global.session_id.is_none());
        assert_eq!(scoped.session_id, Some(session));
    }
}
