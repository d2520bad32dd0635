//! HTTP DTOs for memory endpoints.
//!
//! These types decouple the HTTP API from domain types. Write requests carry
//! `userUUID` (the platform's field name); handlers reject writes without it.

use serde::{Deserialize, Serialize};

use crate::domain::memory::{ProfilePatch, UserProfile};

// ════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Body of `POST /api/memory/conversation`.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConversationRequest {
    #[serde(rename = "userUUID")]
    pub user_uuid: Option<String>,
    /// Defaults to "user" when absent.
    pub role: Option<String>,
    pub message: Option<String>,
    pub stage: Option<String>,
}

/// Body of `POST /api/memory/profile`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertProfileRequest {
    #[serde(rename = "userUUID")]
    pub user_uuid: Option<String>,
    pub display_name: Option<String>,
    pub current_stage: Option<String>,
    pub session_count: Option<i64>,
    pub recurring_themes: Option<Vec<String>>,
}

impl UpsertProfileRequest {
    pub fn into_patch(self) -> ProfilePatch {
        ProfilePatch {
            display_name: self.display_name,
            current_stage: self.current_stage,
            session_count: self.session_count,
            recurring_themes: self.recurring_themes,
        }
    }
}

/// Body of `POST /api/memory/stages`.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordStageRequest {
    #[serde(rename = "userUUID")]
    pub user_uuid: Option<String>,
    pub stage: Option<String>,
    pub session_id: Option<String>,
}

/// Body of `POST /api/memory/context`.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreContextRequest {
    #[serde(rename = "userUUID")]
    pub user_uuid: Option<String>,
    pub context: Option<serde_json::Value>,
    pub session_id: Option<String>,
}

/// Body of `POST /api/memory/session/:session_id/breakthrough`.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordBreakthroughRequest {
    #[serde(rename = "userUUID")]
    pub user_uuid: Option<String>,
    pub description: Option<String>,
}

/// Body of `POST /api/memory/session/:session_id/theme`.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordThemeRequest {
    #[serde(rename = "userUUID")]
    pub user_uuid: Option<String>,
    pub theme: Option<String>,
}

/// Query string for history reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<usize>,
    pub session_id: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Acknowledgement for a successful write.
#[derive(Debug, Clone, Serialize)]
pub struct WriteResponse {
    pub success: bool,
    pub id: String,
    pub created_at: String,
}

/// Soft failure payload, also used for validation errors.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

/// Acknowledgement without a created record (delete, profile upsert).
#[derive(Debug, Clone, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Profile as exposed over HTTP.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileResponse {
    #[serde(rename = "userUUID")]
    pub user_uuid: String,
    pub display_name: Option<String>,
    pub current_stage: Option<String>,
    pub registered_at: String,
    pub session_count: i64,
    pub recurring_themes: Vec<String>,
    pub updated_at: String,
}

impl From<UserProfile> for ProfileResponse {
    fn from(profile: UserProfile) -> Self {
        Self {
            user_uuid: profile.user_id.to_string(),
            display_name: profile.display_name,
            current_stage: profile.current_stage,
            registered_at: profile.registered_at.to_rfc3339(),
            session_count: profile.session_count,
            recurring_themes: profile.recurring_themes,
            updated_at: profile.updated_at.to_rfc3339(),
        }
    }
}
