//! DTOs for inbound voice-platform webhook events.

use serde::{Deserialize, Serialize};

/// An inbound event from the voice platform. Every field is optional: the
/// platform sends several event shapes and the receiver only persists the
/// ones that carry both a user and a message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookEvent {
    pub user_id: Option<String>,
    pub message: Option<String>,
    /// "user" or "assistant"; defaults to "user".
    pub role: Option<String>,
    pub stage: Option<String>,
}

/// The receiver always acknowledges authorized events, even ones it did not
/// persist, so the platform does not retry.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookAck {
    pub success: bool,
}

impl WebhookAck {
    pub fn ok() -> Self {
        Self { success: true }
    }
}
