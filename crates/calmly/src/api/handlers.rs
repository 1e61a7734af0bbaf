//! API request handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;
use tracing::info;

use crate::activity::{Activity, LogActivityRequest, LogActivityResponse};
use crate::auth::CurrentUser;
use crate::chat::{
    ChatMessage, CreateSessionResponse, SendMessageRequest, SendMessageResponse, Session,
    SessionSummary,
};

use super::error::ApiResult;
use super::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Create a new chat session.
pub async fn create_session(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<CreateSessionResponse>> {
    let session = state.chat.create_session(&user.user_id).await?;
    Ok(Json(CreateSessionResponse {
        session_id: session.session_id,
    }))
}

/// List the caller's sessions, most recently updated first.
pub async fn list_sessions(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<SessionSummary>>> {
    let sessions = state.chat.list_sessions(&user.user_id).await?;
    Ok(Json(sessions))
}

/// Fetch one session with its messages.
pub async fn get_session(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(session_id): Path<String>,
) -> ApiResult<Json<Session>> {
    let session = state.chat.get_session(&user.user_id, &session_id).await?;
    Ok(Json(session))
}

/// Send a message and return the assistant's reply.
pub async fn send_message(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(session_id): Path<String>,
    Json(request): Json<SendMessageRequest>,
) -> ApiResult<Json<SendMessageResponse>> {
    let response = state
        .chat
        .send_message(&user.user_id, &session_id, &request.message)
        .await?;
    Ok(Json(response))
}

/// Fetch the ordered message history for a session.
pub async fn get_history(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(session_id): Path<String>,
) -> ApiResult<Json<Vec<ChatMessage>>> {
    let history = state.chat.history(&user.user_id, &session_id).await?;
    Ok(Json(history))
}

/// Log a new activity.
pub async fn log_activity(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<LogActivityRequest>,
) -> ApiResult<(StatusCode, Json<LogActivityResponse>)> {
    let activity = state.activities.log_activity(&user.user_id, request).await?;
    info!(user_id = %user.user_id, "activity recorded");
    Ok((
        StatusCode::CREATED,
        Json(LogActivityResponse {
            success: true,
            data: activity,
        }),
    ))
}

/// Today's activities for the caller, newest first.
pub async fn today_activities(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<Activity>>> {
    let activities = state.activities.today(&user.user_id).await?;
    Ok(Json(activities))
}
