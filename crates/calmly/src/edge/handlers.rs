//! Edge proxy handlers.
//!
//! Each handler authenticates the caller, forwards the request to the
//! backend and relays the result. Success responses pass through verbatim;
//! failures are reduced to the uniform `{ "error": message }` envelope.

use axum::{
    body::{Body, Bytes},
    extract::{Path, State},
    http::{Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::{debug, error, warn};

use crate::api::{ApiError, normalize_error_message};

use super::credentials::CredentialSource;
use super::state::EdgeState;

/// Proxy health check. Answers locally; the backend is not consulted.
pub async fn health() -> Response {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
    .into_response()
}

/// Start a new conversation session.
pub async fn create_session(
    State(state): State<EdgeState>,
    headers: axum::http::HeaderMap,
) -> Response {
    let Some(credential) = CredentialSource::extract(&headers) else {
        return unauthorized();
    };
    forward(
        &state,
        Method::POST,
        "/chat/sessions",
        &credential,
        None,
        "Failed to create chat session",
    )
    .await
}

/// List the caller's sessions.
pub async fn list_sessions(
    State(state): State<EdgeState>,
    headers: axum::http::HeaderMap,
) -> Response {
    let Some(credential) = CredentialSource::extract(&headers) else {
        return unauthorized();
    };
    forward(
        &state,
        Method::GET,
        "/chat/sessions",
        &credential,
        None,
        "Failed to fetch chat sessions",
    )
    .await
}

/// Send a message within a session.
pub async fn send_message(
    State(state): State<EdgeState>,
    headers: axum::http::HeaderMap,
    Path(session_id): Path<String>,
    body: Bytes,
) -> Response {
    let Some(credential) = CredentialSource::extract(&headers) else {
        return unauthorized();
    };
    forward(
        &state,
        Method::POST,
        &format!("/chat/sessions/{}/messages", session_id),
        &credential,
        Some(body),
        "Failed to process chat message",
    )
    .await
}

/// Fetch the ordered history for a session.
pub async fn get_history(
    State(state): State<EdgeState>,
    headers: axum::http::HeaderMap,
    Path(session_id): Path<String>,
) -> Response {
    let Some(credential) = CredentialSource::extract(&headers) else {
        return unauthorized();
    };
    forward(
        &state,
        Method::GET,
        &format!("/chat/sessions/{}/history", session_id),
        &credential,
        None,
        "Failed to fetch chat history",
    )
    .await
}

/// Log a completed activity.
pub async fn log_activity(
    State(state): State<EdgeState>,
    headers: axum::http::HeaderMap,
    body: Bytes,
) -> Response {
    let Some(credential) = CredentialSource::extract(&headers) else {
        return unauthorized();
    };
    forward(
        &state,
        Method::POST,
        "/activities",
        &credential,
        Some(body),
        "Failed to log activity",
    )
    .await
}

/// Today's activities for the caller.
pub async fn today_activities(
    State(state): State<EdgeState>,
    headers: axum::http::HeaderMap,
) -> Response {
    let Some(credential) = CredentialSource::extract(&headers) else {
        return unauthorized();
    };
    forward(
        &state,
        Method::GET,
        "/activity/today",
        &credential,
        None,
        "Failed to fetch today's activities",
    )
    .await
}

fn unauthorized() -> Response {
    ApiError::unauthorized("Authentication required").into_response()
}

/// Forward a request to the backend and relay the result.
///
/// Success responses pass through with status, content type and body
/// unchanged. Failure responses are normalized into the error envelope,
/// preserving the upstream status code. Timeouts and refused connections
/// become 502; any other transport fault is a 500 with a generic message.
async fn forward(
    state: &EdgeState,
    method: Method,
    path: &str,
    credential: &str,
    body: Option<Bytes>,
    fallback: &str,
) -> Response {
    let url = state.backend(path);

    let mut request = state
        .http
        .request(method, &url)
        .header(header::AUTHORIZATION, credential);
    if let Some(body) = body {
        request = request
            .header(header::CONTENT_TYPE, "application/json")
            .body(body);
    }

    let response = match request.send().await {
        Ok(response) => response,
        Err(err) if err.is_timeout() || err.is_connect() => {
            warn!(%url, error = %err, "backend unreachable");
            return ApiError::bad_gateway("Upstream service unavailable").into_response();
        }
        Err(err) => {
            error!(%url, error = %err, "backend request failed");
            return ApiError::internal("Internal server error").into_response();
        }
    };

    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let bytes = match response.bytes().await {
        Ok(bytes) => bytes,
        Err(err) => {
            error!(%url, error = %err, "failed to read backend response");
            return ApiError::internal("Internal server error").into_response();
        }
    };

    if status.is_success() {
        let mut builder = Response::builder().status(status);
        if let Some(content_type) = &content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        return builder
            .body(Body::from(bytes))
            .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response());
    }

    debug!(%url, status = %status, "relaying backend error");
    let message = normalize_error_message(
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown"),
        content_type.as_deref(),
        &bytes,
        fallback,
    );
    (
        status,
        axum::Json(crate::api::ErrorResponse { error: message }),
    )
        .into_response()
}
