//! HTTP handler for the context-aggregation tool.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::application::context::{ContextAggregator, ContextRequest};
use crate::domain::foundation::{SessionId, UserId};

use super::dto::{ContextToolRequest, ToolErrorResponse};

/// Application state for tool endpoints.
#[derive(Clone)]
pub struct ToolsAppState {
    pub aggregator: ContextAggregator,
}

/// POST /api/tools/context
///
/// Aggregation itself never fails; only a missing or malformed user
/// identifier is rejected.
pub async fn fetch_context(
    State(state): State<ToolsAppState>,
    Json(req): Json<ContextToolRequest>,
) -> Response {
    let user_id = match req.user_id.map(UserId::new) {
        Some(Ok(id)) => id,
        Some(Err(e)) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ToolErrorResponse::new(e.to_string())),
            )
                .into_response()
        }
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ToolErrorResponse::new("user_id is required")),
            )
                .into_response()
        }
    };

    let session_id = req
        .session_id
        .and_then(|raw| SessionId::new(raw).ok());

    let request = ContextRequest {
        user_id,
        context_type: req.context_type,
        session_id,
        limit: req.limit.unwrap_or(ContextRequest::DEFAULT_LIMIT).clamp(1, 50),
    };

    let snapshot = state.aggregator.aggregate(request).await;
    Json(snapshot).into_response()
}
