//! HTTP handlers for memory endpoints.
//!
//! No business logic here: parameter extraction, default values, and one
//! storage gateway call each. Validation failures are 400s; storage write
//! failures become 500s with a soft error payload; storage read failures
//! degrade to empty/default bodies so the agent keeps talking.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::domain::foundation::{SessionId, UserId};
use crate::domain::memory::{
    BreakthroughMoment, ContextEntry, ConversationEntry, SessionTheme, SpeakerRole,
    StageProgression,
};
use crate::ports::{HistoryQuery, MemoryStore};

use super::dto::{
    ErrorResponse, HistoryParams, ProfileResponse, RecordBreakthroughRequest, RecordStageRequest,
    RecordThemeRequest, StoreContextRequest, StoreConversationRequest, SuccessResponse,
    UpsertProfileRequest, WriteResponse,
};

/// Application state for memory endpoints.
#[derive(Clone)]
pub struct MemoryAppState {
    pub store: Arc<dyn MemoryStore>,
}

/// Resolves the `userUUID` body field, rejecting writes without one.
fn require_user(user_uuid: Option<String>) -> Result<UserId, Response> {
    let raw = user_uuid.ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("userUUID is required")),
        )
            .into_response()
    })?;
    UserId::new(raw).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(e.to_string())),
        )
            .into_response()
    })
}

fn path_user(raw: String) -> Result<UserId, Response> {
    require_user(Some(raw))
}

fn path_session(raw: String) -> Result<SessionId, Response> {
    SessionId::new(raw).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(e.to_string())),
        )
            .into_response()
    })
}

fn history_query(params: &HistoryParams) -> Result<HistoryQuery, Response> {
    let mut query = HistoryQuery::with_limit(params.limit.unwrap_or(HistoryQuery::DEFAULT_LIMIT));
    if let Some(raw) = &params.session_id {
        query = query.for_session(path_session(raw.clone())?);
    }
    Ok(query)
}

fn write_failure(err: impl std::fmt::Display) -> Response {
    tracing::error!(error = %err, "memory write failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(format!("Failed to persist: {err}"))),
    )
        .into_response()
}

fn written(id: impl std::fmt::Display, created_at: impl std::fmt::Display) -> Response {
    (
        StatusCode::OK,
        Json(WriteResponse {
            success: true,
            id: id.to_string(),
            created_at: created_at.to_string(),
        }),
    )
        .into_response()
}

// ════════════════════════════════════════════════════════════════════════════
// Conversation
// ════════════════════════════════════════════════════════════════════════════

/// POST /api/memory/conversation
pub async fn store_conversation(
    State(state): State<MemoryAppState>,
    Json(req): Json<StoreConversationRequest>,
) -> Response {
    let user_id = match require_user(req.user_uuid) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let Some(message) = req.message.filter(|m| !m.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("message is required")),
        )
            .into_response();
    };
    let role = match req.role.as_deref().unwrap_or("user").parse::<SpeakerRole>() {
        Ok(role) => role,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new(e.to_string())),
            )
                .into_response()
        }
    };

    let entry = ConversationEntry::new(user_id, role, message, req.stage);
    match state.store.store_conversation_entry(entry).await {
        Ok(stored) => written(stored.id, stored.created_at),
        Err(e) => write_failure(e),
    }
}

/// GET /api/memory/conversation/:user_id
pub async fn get_conversation(
    State(state): State<MemoryAppState>,
    Path(user_id): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Response {
    let user_id = match path_user(user_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let query = match history_query(&params) {
        Ok(q) => q,
        Err(resp) => return resp,
    };

    let entries = match state.store.conversation_history(&user_id, &query).await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(user_id = %user_id, error = %e, "conversation read failed");
            Vec::new()
        }
    };
    Json(entries).into_response()
}

// ════════════════════════════════════════════════════════════════════════════
// Profile
// ════════════════════════════════════════════════════════════════════════════

/// POST /api/memory/profile
pub async fn upsert_profile(
    State(state): State<MemoryAppState>,
    Json(req): Json<UpsertProfileRequest>,
) -> Response {
    let user_id = match require_user(req.user_uuid.clone()) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match state.store.upsert_profile(&user_id, req.into_patch()).await {
        Ok(profile) => Json(ProfileResponse::from(profile)).into_response(),
        Err(e) => write_failure(e),
    }
}

/// GET /api/memory/profile/:user_id
pub async fn get_profile(
    State(state): State<MemoryAppState>,
    Path(user_id): Path<String>,
) -> Response {
    let user_id = match path_user(user_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let profile = match state.store.fetch_profile(&user_id).await {
        Ok(profile) => profile,
        Err(e) => {
            tracing::warn!(user_id = %user_id, error = %e, "profile read failed");
            None
        }
    };
    Json(profile.map(ProfileResponse::from)).into_response()
}

// ════════════════════════════════════════════════════════════════════════════
// Stages
// ════════════════════════════════════════════════════════════════════════════

/// POST /api/memory/stages
pub async fn record_stage(
    State(state): State<MemoryAppState>,
    Json(req): Json<RecordStageRequest>,
) -> Response {
    let user_id = match require_user(req.user_uuid) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let Some(stage) = req.stage.filter(|s| !s.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("stage is required")),
        )
            .into_response();
    };
    let session_id = match req.session_id.map(path_session).transpose() {
        Ok(sid) => sid,
        Err(resp) => return resp,
    };

    let progression = StageProgression::new(user_id, stage, session_id);
    match state.store.record_stage(progression).await {
        Ok(stored) => written(stored.id, stored.created_at),
        Err(e) => write_failure(e),
    }
}

/// GET /api/memory/stages/:user_id
pub async fn get_stages(
    State(state): State<MemoryAppState>,
    Path(user_id): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Response {
    let user_id = match path_user(user_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let query = match history_query(&params) {
        Ok(q) => q,
        Err(resp) => return resp,
    };

    let stages = match state.store.stage_history(&user_id, &query).await {
        Ok(stages) => stages,
        Err(e) => {
            tracing::warn!(user_id = %user_id, error = %e, "stage read failed");
            Vec::new()
        }
    };
    Json(stages).into_response()
}

// ════════════════════════════════════════════════════════════════════════════
// Context
// ════════════════════════════════════════════════════════════════════════════

/// POST /api/memory/context
pub async fn store_context(
    State(state): State<MemoryAppState>,
    Json(req): Json<StoreContextRequest>,
) -> Response {
    let user_id = match require_user(req.user_uuid) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let Some(payload) = req.context else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("context is required")),
        )
            .into_response();
    };
    let session_id = match req.session_id.map(path_session).transpose() {
        Ok(sid) => sid,
        Err(resp) => return resp,
    };

    let entry = ContextEntry::new(user_id, payload, session_id);
    match state.store.store_context(entry).await {
        Ok(stored) => written(stored.id, stored.created_at),
        Err(e) => write_failure(e),
    }
}

/// GET /api/memory/context/:user_id
pub async fn get_context(
    State(state): State<MemoryAppState>,
    Path(user_id): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Response {
    let user_id = match path_user(user_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let query = match history_query(&params) {
        Ok(q) => q,
        Err(resp) => return resp,
    };

    let entries = match state.store.context_history(&user_id, &query).await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(user_id = %user_id, error = %e, "context read failed");
            Vec::new()
        }
    };
    Json(entries).into_response()
}

// ════════════════════════════════════════════════════════════════════════════
// Session sub-records
// ════════════════════════════════════════════════════════════════════════════

/// POST /api/memory/session/:session_id/breakthrough
pub async fn record_breakthrough(
    State(state): State<MemoryAppState>,
    Path(session_id): Path<String>,
    Json(req): Json<RecordBreakthroughRequest>,
) -> Response {
    let session_id = match path_session(session_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let user_id = match require_user(req.user_uuid) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let Some(description) = req.description.filter(|d| !d.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("description is required")),
        )
            .into_response();
    };

    let moment = BreakthroughMoment::new(user_id, session_id, description);
    match state.store.record_breakthrough(moment).await {
        Ok(stored) => written(stored.id, stored.created_at),
        Err(e) => write_failure(e),
    }
}

/// GET /api/memory/session/:session_id/breakthroughs
pub async fn get_breakthroughs(
    State(state): State<MemoryAppState>,
    Path(session_id): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Response {
    let session_id = match path_session(session_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let limit = HistoryQuery::with_limit(params.limit.unwrap_or(HistoryQuery::DEFAULT_LIMIT)).limit;

    let moments = match state
        .store
        .breakthroughs_for_session(&session_id, limit)
        .await
    {
        Ok(moments) => moments,
        Err(e) => {
            tracing::warn!(session_id = %session_id, error = %e, "breakthrough read failed");
            Vec::new()
        }
    };
    Json(moments).into_response()
}

/// POST /api/memory/session/:session_id/theme
pub async fn record_theme(
    State(state): State<MemoryAppState>,
    Path(session_id): Path<String>,
    Json(req): Json<RecordThemeRequest>,
) -> Response {
    let session_id = match path_session(session_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let user_id = match require_user(req.user_uuid) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let Some(theme) = req.theme.filter(|t| !t.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("theme is required")),
        )
            .into_response();
    };

    let theme = SessionTheme::new(user_id, session_id, theme);
    match state.store.record_theme(theme).await {
        Ok(stored) => written(stored.id, stored.created_at),
        Err(e) => write_failure(e),
    }
}

/// GET /api/memory/session/:session_id/themes
pub async fn get_themes(
    State(state): State<MemoryAppState>,
    Path(session_id): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Response {
    let session_id = match path_session(session_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let limit = HistoryQuery::with_limit(params.limit.unwrap_or(HistoryQuery::DEFAULT_LIMIT)).limit;

    let themes = match state.store.themes_for_session(&session_id, limit).await {
        Ok(themes) => themes,
        Err(e) => {
            tracing::warn!(session_id = %session_id, error = %e, "theme read failed");
            Vec::new()
        }
    };
    Json(themes).into_response()
}

// ════════════════════════════════════════════════════════════════════════════
// User-data erasure
// ════════════════════════════════════════════════════════════════════════════

/// DELETE /api/memory/user/:user_id
pub async fn delete_user(
    State(state): State<MemoryAppState>,
    Path(user_id): Path<String>,
) -> Response {
    let user_id = match path_user(user_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match state.store.erase_user(&user_id).await {
        Ok(()) => Json(SuccessResponse::ok()).into_response(),
        Err(e) => write_failure(e),
    }
}
