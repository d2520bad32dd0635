//! HTTP adapters - REST API implementations.
//!
//! Each module has its own `dto`/`handlers`/`routes` trio; `build_router`
//! assembles them under `/api` with tracing and permissive CORS.

pub mod memory;
pub mod tools;
pub mod webhook;

use std::sync::Arc;

use axum::{routing::get, Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::application::context::ContextAggregator;
use crate::config::WebhookConfig;
use crate::ports::MemoryStore;

pub use memory::{memory_router, MemoryAppState};
pub use tools::{tools_router, ToolsAppState};
pub use webhook::{webhook_router, WebhookAppState};

/// GET /api/health
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Assemble the full application router over one storage gateway.
pub fn build_router(store: Arc<dyn MemoryStore>, webhook_config: WebhookConfig) -> Router {
    let memory_state = MemoryAppState {
        store: store.clone(),
    };
    let tools_state = ToolsAppState {
        aggregator: ContextAggregator::new(store.clone()),
    };
    let webhook_state = WebhookAppState {
        store,
        config: webhook_config,
    };

    Router::new()
        .route("/api/health", get(health))
        .nest("/api/memory", memory_router().with_state(memory_state))
        .nest("/api/tools", tools_router().with_state(tools_state))
        .merge(webhook_router().with_state(webhook_state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemoryStore;

    #[test]
    fn full_router_can_be_constructed() {
        let store: Arc<dyn MemoryStore> = Arc::new(InMemoryStore::new());
        let _router = build_router(store, WebhookConfig::default());
    }
}
