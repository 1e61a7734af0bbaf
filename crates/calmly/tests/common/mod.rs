//! Shared helpers for integration tests.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use serde_json::Value;
use tower::ServiceExt;

use calmly::activity::{ActivityRepository, ActivityService};
use calmly::api::{AppState, create_router};
use calmly::assistant::ScriptedEngine;
use calmly::chat::{ChatDb, ChatRepository, ChatService};
use calmly::notify::NullNotifier;

/// Build backend state over an in-memory database with the scripted
/// engine and a no-op notifier.
pub async fn test_state() -> AppState {
    let db = ChatDb::in_memory().await.expect("in-memory database");
    let chat = ChatService::new(ChatRepository::new(db.clone()), Arc::new(ScriptedEngine::new()));
    let activities = ActivityService::new(ActivityRepository::new(db), Arc::new(NullNotifier));
    AppState::new(chat, activities)
}

/// Build the backend router over fresh in-memory state.
pub async fn test_app() -> Router {
    create_router(test_state().await)
}

/// Like [`test_app`], but keeps a handle to the underlying database so
/// tests can seed rows directly.
pub async fn test_app_with_db() -> (Router, ChatDb) {
    let db = ChatDb::in_memory().await.expect("in-memory database");
    let chat = ChatService::new(ChatRepository::new(db.clone()), Arc::new(ScriptedEngine::new()));
    let activities =
        ActivityService::new(ActivityRepository::new(db.clone()), Arc::new(NullNotifier));
    (create_router(AppState::new(chat, activities)), db)
}

/// Issue one request against a router and decode the JSON body.
pub async fn send(
    app: &Router,
    method: &str,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

/// Serve a router on an ephemeral local port and return its base URL.
pub async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}
