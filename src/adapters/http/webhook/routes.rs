//! Axum router configuration for the webhook endpoint.

use axum::{routing::post, Router};

use super::handlers::{receive_event, WebhookAppState};

/// Create the webhook router.
///
/// Carries its full path; merge it into the application router.
pub fn webhook_router() -> Router<WebhookAppState> {
    Router::new().route("/api/elevenlabs-webhook", post(receive_event))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn router_can_be_constructed() {
        let _router = webhook_router();
    }
}
