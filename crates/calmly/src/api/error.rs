//! Unified API error handling.
//!
//! Every failure leaving the backend or the edge tier is rendered as a
//! `{ "error": message }` envelope with the originating status code.
//! Internal detail stays in the server-side log.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

use crate::activity::ActivityError;
use crate::assistant::EngineError;
use crate::auth::AuthError;
use crate::chat::ChatError;

/// API error type with structured responses.
#[derive(Debug, Error)]
pub enum ApiError {
    // Variants render their message bare; the envelope carries no prefix.
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    BadGateway(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn bad_gateway(msg: impl Into<String>) -> Self {
        Self::BadGateway(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadGateway(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error envelope returned to callers.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match &self {
            // Internal detail is logged, never echoed to the caller.
            ApiError::Internal(msg) => {
                error!(message = %msg, "API error");
                "Internal server error".to_string()
            }
            ApiError::BadGateway(msg) => {
                warn!(message = %msg, "upstream failure");
                self.to_string()
            }
            _ => {
                tracing::debug!(message = %self, "client error");
                self.to_string()
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredential => {
                ApiError::Unauthorized("Authentication required".to_string())
            }
            AuthError::InvalidHeader => {
                ApiError::Unauthorized("Invalid authorization header".to_string())
            }
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::SessionNotFound(id) => ApiError::NotFound(format!("Session not found: {}", id)),
            ChatError::EmptyMessage => ApiError::BadRequest("Message is required".to_string()),
            ChatError::Engine(e) => ApiError::BadGateway(e.to_string()),
            ChatError::Storage(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<ActivityError> for ApiError {
    fn from(err: ActivityError) -> Self {
        match err {
            ActivityError::InvalidType(msg) => ApiError::BadRequest(msg),
            ActivityError::Storage(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        ApiError::BadGateway(err.to_string())
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Derive a human-readable message from an upstream failure body.
///
/// Structured (JSON) bodies are mined with precedence `error` field >
/// `message` field > fallback; anything else synthesizes a message that
/// embeds the numeric status and its canonical reason.
pub fn normalize_error_message(
    status: u16,
    reason: &str,
    content_type: Option<&str>,
    body: &[u8],
    fallback: &str,
) -> String {
    let is_json = content_type.is_some_and(|ct| ct.contains("application/json"));

    if is_json {
        if let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) {
            if let Some(msg) = value.get("error").and_then(|v| v.as_str()) {
                return msg.to_string();
            }
            if let Some(msg) = value.get("message").and_then(|v| v.as_str()) {
                return msg.to_string();
            }
            return fallback.to_string();
        }
    }

    format!("{}: {} {}", fallback, status, reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::not_found("").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::bad_request("").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::unauthorized("").status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::bad_gateway("").status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::internal("").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_normalize_prefers_error_field() {
        let body = br#"{"error": "session gone", "message": "ignored"}"#;
        let msg = normalize_error_message(404, "Not Found", Some("application/json"), body, "fb");
        assert_eq!(msg, "session gone");
    }

    #[test]
    fn test_normalize_falls_back_to_message_field() {
        let body = br#"{"message": "token expired"}"#;
        let msg = normalize_error_message(401, "Unauthorized", Some("application/json"), body, "fb");
        assert_eq!(msg, "token expired");
    }

    #[test]
    fn test_normalize_json_without_fields_uses_fallback() {
        let body = br#"{"detail": 42}"#;
        let msg = normalize_error_message(500, "Internal Server Error", Some("application/json"), body, "request failed");
        assert_eq!(msg, "request failed");
    }

    #[test]
    fn test_normalize_non_json_embeds_status() {
        let body = b"<html>Bad Gateway</html>";
        let msg = normalize_error_message(502, "Bad Gateway", Some("text/html"), body, "request failed");
        assert_eq!(msg, "request failed: 502 Bad Gateway");
    }

    #[test]
    fn test_normalize_missing_content_type_embeds_status() {
        let msg = normalize_error_message(503, "Service Unavailable", None, b"", "upstream call failed");
        assert!(msg.contains("503"));
        assert!(msg.contains("Service Unavailable"));
    }
}
