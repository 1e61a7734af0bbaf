//! Backend API route definitions.

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use super::handlers;
use super::state::AppState;

/// Create the backend application router.
pub fn create_router(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/health", get(handlers::health))
        // Chat session routes
        .route(
            "/chat/sessions",
            get(handlers::list_sessions).post(handlers::create_session),
        )
        .route("/chat/sessions/{session_id}", get(handlers::get_session))
        .route(
            "/chat/sessions/{session_id}/messages",
            post(handlers::send_message),
        )
        .route(
            "/chat/sessions/{session_id}/history",
            get(handlers::get_history),
        )
        // Activity routes
        .route("/activities", post(handlers::log_activity))
        .route("/activity/today", get(handlers::today_activities))
        .with_state(state)
        .layer(trace_layer)
}
