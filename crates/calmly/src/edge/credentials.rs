//! Caller credential extraction.

use axum::http::{HeaderMap, header};

/// Single place the proxy looks for the caller's credential.
///
/// The `Authorization` header is canonical; the `token` cookie is accepted
/// for compatibility. When both are present the header wins, so the two
/// transports can never diverge.
pub struct CredentialSource;

impl CredentialSource {
    /// Extract a forwardable `Bearer ...` credential, if any.
    pub fn extract(headers: &HeaderMap) -> Option<String> {
        if let Some(value) = Self::from_authorization(headers) {
            return Some(value);
        }
        Self::from_cookie(headers)
    }

    fn from_authorization(headers: &HeaderMap) -> Option<String> {
        let raw = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim();
        if raw.is_empty() {
            return None;
        }
        Some(raw.to_string())
    }

    fn from_cookie(headers: &HeaderMap) -> Option<String> {
        for value in headers.get_all(header::COOKIE) {
            let Ok(raw) = value.to_str() else {
                continue;
            };
            for pair in raw.split(';') {
                if let Some(token) = pair.trim().strip_prefix("token=") {
                    let token = token.trim();
                    if !token.is_empty() {
                        return Some(format!("Bearer {}", token));
                    }
                }
            }
        }
        None
    }
}
