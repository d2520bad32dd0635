//! Axum router configuration for memory endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};

use super::handlers::{
    delete_user, get_breakthroughs, get_context, get_conversation, get_profile, get_stages,
    get_themes, record_breakthrough, record_stage, record_theme, store_context,
    store_conversation, upsert_profile, MemoryAppState,
};

/// Create the memory API router.
///
/// Suitable for mounting at `/api/memory`.
///
/// # Routes
///
/// - `POST /conversation` · `GET /conversation/:user_id`
/// - `POST /profile` · `GET /profile/:user_id`
/// - `POST /stages` · `GET /stages/:user_id`
/// - `POST /context` · `GET /context/:user_id`
/// - `POST /session/:session_id/breakthrough` · `GET /session/:session_id/breakthroughs`
/// - `POST /session/:session_id/theme` · `GET /session/:session_id/themes`
/// - `DELETE /user/:user_id`
pub fn memory_router() -> Router<MemoryAppState> {
    Router::new()
        .route("/conversation", post(store_conversation))
        .route("/conversation/:user_id", get(get_conversation))
        .route("/profile", post(upsert_profile))
        .route("/profile/:user_id", get(get_profile))
        .route("/stages", post(record_stage))
        .route("/stages/:user_id", get(get_stages))
        .route("/context", post(store_context))
        .route("/context/:user_id", get(get_context))
        .route("/session/:session_id/breakthrough", post(record_breakthrough))
        .route("/session/:session_id/breakthroughs", get(get_breakthroughs))
        .route("/session/:session_id/theme", post(record_theme))
        .route("/session/:session_id/themes", get(get_themes))
        .route("/user/:user_id", delete(delete_user))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn router_can_be_constructed() {
        let _router = memory_router();
    }
}
