//! Edge proxy route definitions.

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, warn};

use super::handlers;
use super::state::EdgeState;

/// Create the edge proxy router.
pub fn create_edge_router(state: EdgeState, allowed_origins: &[String]) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/health", get(handlers::health))
        // Conversation routes
        .route("/chat", post(handlers::create_session))
        .route("/chat/sessions", get(handlers::list_sessions))
        .route("/chat/sessions/{session_id}", post(handlers::send_message))
        .route(
            "/chat/sessions/{session_id}/history",
            get(handlers::get_history),
        )
        // Activity routes
        .route("/activities", post(handlers::log_activity))
        .route("/activity/today", get(handlers::today_activities))
        .with_state(state)
        .layer(build_cors_layer(allowed_origins))
        .layer(trace_layer)
}

fn build_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin, "skipping unparseable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::COOKIE,
        ])
        .allow_credentials(true)
}
