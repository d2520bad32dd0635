//! HTTP handler for the voice-platform webhook.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::config::WebhookConfig;
use crate::domain::foundation::UserId;
use crate::domain::memory::{ConversationEntry, SpeakerRole};
use crate::ports::MemoryStore;

use super::dto::{WebhookAck, WebhookEvent};

/// Header carrying the shared secret.
pub const SECRET_HEADER: &str = "x-webhook-secret";

/// Application state for the webhook endpoint.
#[derive(Clone)]
pub struct WebhookAppState {
    pub store: Arc<dyn MemoryStore>,
    pub config: WebhookConfig,
}

/// POST /api/elevenlabs-webhook
///
/// Secret mismatch is the only rejection. Events missing `user_id` or
/// `message` are acknowledged without a write; persistence failures are
/// logged and still acknowledged so the platform does not retry.
pub async fn receive_event(
    State(state): State<WebhookAppState>,
    headers: HeaderMap,
    Json(event): Json<WebhookEvent>,
) -> Response {
    let presented = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
    if !state.config.authorizes(presented) {
        return (StatusCode::UNAUTHORIZED, Json(WebhookAck { success: false }))
            .into_response();
    }

    let user_id = event
        .user_id
        .filter(|id| !id.trim().is_empty())
        .and_then(|id| UserId::new(id).ok());
    let message = event.message.filter(|m| !m.is_empty());

    let (Some(user_id), Some(message)) = (user_id, message) else {
        tracing::debug!("webhook event without user_id/message, acknowledged without write");
        return Json(WebhookAck::ok()).into_response();
    };

    let role = event
        .role
        .as_deref()
        .and_then(|r| r.parse::<SpeakerRole>().ok())
        .unwrap_or(SpeakerRole::User);
    let entry = ConversationEntry::new(user_id.clone(), role, message, event.stage);

    if let Err(e) = state.store.store_conversation_entry(entry).await {
        tracing::error!(user_id = %user_id, error = %e, "webhook conversation write failed");
    }

    Json(WebhookAck::ok()).into_response()
}
