//! Integration tests for the memory HTTP surface.
//!
//! Drives the assembled router over the in-memory storage gateway, covering
//! write/read round trips, validation failures, user-data erasure, and the
//! webhook receiver's acknowledge-always contract.

use std::sync::Arc;

use axum::body::Body;
use axum::Router;
use http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use solace_memory::adapters::http::build_router;
use solace_memory::adapters::storage::InMemoryStore;
use solace_memory::config::WebhookConfig;
use solace_memory::domain::foundation::UserId;
use solace_memory::ports::{HistoryQuery, MemoryStore};

fn test_app() -> (Router, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new());
    let router = build_router(store.clone(), WebhookConfig::default());
    (router, store)
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.expect("request failed");
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response was not JSON")
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn health_endpoint_responds() {
    let (router, _) = test_app();
    let (status, body) = send(&router, get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn conversation_write_then_read_is_most_recent_first() {
    let (router, _) = test_app();

    for text in ["first message", "second message"] {
        let (status, body) = send(
            &router,
            post_json(
                "/api/memory/conversation",
                json!({ "userUUID": "user-1", "message": text }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        // Server-assigned identifier and timestamp come back with the ack.
        assert!(body["id"].as_str().is_some_and(|id| !id.is_empty()));
        assert!(body["created_at"].as_str().is_some());
    }

    let (status, body) = send(&router, get("/api/memory/conversation/user-1")).await;
    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().expect("history should be an array");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["content"], "second message");
    assert_eq!(entries[1]["content"], "first message");
    assert_eq!(entries[0]["role"], "user");
}

#[tokio::test]
async fn conversation_history_honors_limit() {
    let (router, _) = test_app();
    for i in 0..5 {
        send(
            &router,
            post_json(
                "/api/memory/conversation",
                json!({ "userUUID": "user-1", "message": format!("msg {i}") }),
            ),
        )
        .await;
    }

    let (_, body) = send(&router, get("/api/memory/conversation/user-1?limit=2")).await;
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn write_without_user_uuid_is_rejected_without_storage_call() {
    let (router, store) = test_app();

    let (status, body) = send(
        &router,
        post_json("/api/memory/conversation", json!({ "message": "hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("userUUID"));

    // Nothing reached the gateway.
    let all_users_empty = store
        .conversation_history(&UserId::new("user-1").unwrap(), &HistoryQuery::default())
        .await
        .unwrap()
        .is_empty();
    assert!(all_users_empty);
}

#[tokio::test]
async fn invalid_role_is_a_validation_error() {
    let (router, _) = test_app();
    let (status, _) = send(
        &router,
        post_json(
            "/api/memory/conversation",
            json!({ "userUUID": "user-1", "message": "hi", "role": "narrator" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn profile_upsert_merges_and_reads_back() {
    let (router, _) = test_app();

    let (status, body) = send(
        &router,
        post_json(
            "/api/memory/profile",
            json!({ "userUUID": "user-1", "display_name": "Ada" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["display_name"], "Ada");

    send(
        &router,
        post_json(
            "/api/memory/profile",
            json!({ "userUUID": "user-1", "current_stage": "awareness" }),
        ),
    )
    .await;

    let (status, body) = send(&router, get("/api/memory/profile/user-1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["display_name"], "Ada");
    assert_eq!(body["current_stage"], "awareness");
    assert_eq!(body["userUUID"], "user-1");
}

#[tokio::test]
async fn missing_profile_reads_as_null() {
    let (router, _) = test_app();
    let (status, body) = send(&router, get("/api/memory/profile/nobody")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_null());
}

#[tokio::test]
async fn stages_and_session_records_round_trip() {
    let (router, _) = test_app();

    send(
        &router,
        post_json(
            "/api/memory/stages",
            json!({ "userUUID": "user-1", "stage": "grounding" }),
        ),
    )
    .await;
    send(
        &router,
        post_json(
            "/api/memory/stages",
            json!({ "userUUID": "user-1", "stage": "awareness", "session_id": "sess-1" }),
        ),
    )
    .await;

    let (_, body) = send(&router, get("/api/memory/stages/user-1")).await;
    assert_eq!(body.as_array().unwrap().len(), 2);
    let (_, body) = send(&router, get("/api/memory/stages/user-1?session_id=sess-1")).await;
    let scoped = body.as_array().unwrap();
    assert_eq!(scoped.len(), 1);
    assert_eq!(scoped[0]["stage"], "awareness");

    let (status, _) = send(
        &router,
        post_json(
            "/api/memory/session/sess-1/breakthrough",
            json!({ "userUUID": "user-1", "description": "named the fear" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(
        &router,
        post_json(
            "/api/memory/session/sess-1/theme",
            json!({ "userUUID": "user-1", "theme": "self-trust" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&router, get("/api/memory/session/sess-1/breakthroughs")).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    let (_, body) = send(&router, get("/api/memory/session/sess-1/themes")).await;
    assert_eq!(body[0]["theme"], "self-trust");
}

#[tokio::test]
async fn context_entries_round_trip() {
    let (router, _) = test_app();
    let (status, body) = send(
        &router,
        post_json(
            "/api/memory/context",
            json!({ "userUUID": "user-1", "context": { "mood": "calm" } }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (_, body) = send(&router, get("/api/memory/context/user-1")).await;
    assert_eq!(body[0]["payload"]["mood"], "calm");
}

#[tokio::test]
async fn deleting_user_clears_profile_conversations_and_stages() {
    let (router, _) = test_app();
    send(
        &router,
        post_json(
            "/api/memory/conversation",
            json!({ "userUUID": "user-1", "message": "hello" }),
        ),
    )
    .await;
    send(
        &router,
        post_json(
            "/api/memory/profile",
            json!({ "userUUID": "user-1", "display_name": "Ada" }),
        ),
    )
    .await;
    send(
        &router,
        post_json(
            "/api/memory/stages",
            json!({ "userUUID": "user-1", "stage": "grounding" }),
        ),
    )
    .await;

    let (status, body) = send(
        &router,
        Request::builder()
            .method("DELETE")
            .uri("/api/memory/user/user-1")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (_, body) = send(&router, get("/api/memory/conversation/user-1")).await;
    assert!(body.as_array().unwrap().is_empty());
    let (_, body) = send(&router, get("/api/memory/profile/user-1")).await;
    assert!(body.is_null());
    let (_, body) = send(&router, get("/api/memory/stages/user-1")).await;
    assert!(body.as_array().unwrap().is_empty());
}

// ════════════════════════════════════════════════════════════════════════════
// Webhook receiver
// ════════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn webhook_event_persists_conversation_entry() {
    let (router, store) = test_app();
    let (status, body) = send(
        &router,
        post_json(
            "/api/elevenlabs-webhook",
            json!({ "user_id": "user-1", "message": "I feel better today", "role": "user" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let history = store
        .conversation_history(&UserId::new("user-1").unwrap(), &HistoryQuery::default())
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].content, "I feel better today");
}

#[tokio::test]
async fn webhook_without_message_acknowledges_without_writing() {
    let (router, store) = test_app();
    let (status, body) = send(
        &router,
        post_json("/api/elevenlabs-webhook", json!({ "user_id": "user-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let history = store
        .conversation_history(&UserId::new("user-1").unwrap(), &HistoryQuery::default())
        .await
        .unwrap();
    assert!(history.is_empty());
}

#[tokio::test]
async fn webhook_secret_is_checked_exactly() {
    let store: Arc<InMemoryStore> = Arc::new(InMemoryStore::new());
    let router = build_router(store.clone(), WebhookConfig::with_secret("whsec-123"));

    let event = json!({ "user_id": "user-1", "message": "hello" });

    // No header.
    let (status, _) = send(&router, post_json("/api/elevenlabs-webhook", event.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Containing the secret is not enough.
    let request = Request::builder()
        .method("POST")
        .uri("/api/elevenlabs-webhook")
        .header("content-type", "application/json")
        .header("x-webhook-secret", "prefix-whsec-123")
        .body(Body::from(event.to_string()))
        .unwrap();
    let (status, _) = send(&router, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Exact match passes and the entry is written.
    let request = Request::builder()
        .method("POST")
        .uri("/api/elevenlabs-webhook")
        .header("content-type", "application/json")
        .header("x-webhook-secret", "whsec-123")
        .body(Body::from(event.to_string()))
        .unwrap();
    let (status, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let history = store
        .conversation_history(&UserId::new("user-1").unwrap(), &HistoryQuery::default())
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
}
