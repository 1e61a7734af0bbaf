//! Bearer credential extraction for the backend API.
//!
//! The platform treats the bearer token as opaque: identity resolution is
//! owned by the external identity service, and the backend only requires
//! that a non-empty credential is present, keying stored data by it.

use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, header, request::Parts};
use thiserror::Error;

/// Errors raised while extracting the caller's credential.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication required")]
    MissingCredential,

    #[error("Invalid authorization header")]
    InvalidHeader,
}

/// The authenticated caller, derived from the bearer token.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// Opaque key identifying the caller.
    pub user_id: String,
}

/// Pull the bearer token out of an `Authorization` header map. The
/// `Bearer ` prefix is optional, matching what browsers and tools send.
pub fn bearer_token(headers: &HeaderMap) -> Result<String, AuthError> {
    let raw = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredential)?
        .to_str()
        .map_err(|_| AuthError::InvalidHeader)?;

    let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();
    if token.is_empty() {
        return Err(AuthError::MissingCredential);
    }

    Ok(token.to_string())
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = crate::api::ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        Ok(CurrentUser { user_id: token })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_prefix_stripped() {
        let token = bearer_token(&headers_with("Bearer abc123")).unwrap();
        assert_eq!(token, "abc123");
    }

    #[test]
    fn test_raw_token_accepted() {
        let token = bearer_token(&headers_with("abc123")).unwrap();
        assert_eq!(token, "abc123");
    }

    #[test]
    fn test_missing_header_rejected() {
        let err = bearer_token(&HeaderMap::new()).unwrap_err();
        assert!(matches!(err, AuthError::MissingCredential));
    }

    #[test]
    fn test_blank_token_rejected() {
        let err = bearer_token(&headers_with("Bearer   ")).unwrap_err();
        assert!(matches!(err, AuthError::MissingCredential));
    }
}
