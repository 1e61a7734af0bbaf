//! Client-side error taxonomy.

use thiserror::Error;

/// Errors surfaced by the conversation client.
///
/// Server failures are normalized into these variants; no raw transport
/// error type leaks through the client API.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("{0}")]
    Validation(String),

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Request failed: {0}")]
    Transport(String),
}

impl ClientError {
    /// Map a non-2xx status plus its normalized message to a variant.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 => Self::AuthenticationRequired,
            400 => Self::Validation(message),
            502 | 503 | 504 => Self::UpstreamUnavailable(message),
            _ => Self::Api { status, message },
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            Self::UpstreamUnavailable(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
