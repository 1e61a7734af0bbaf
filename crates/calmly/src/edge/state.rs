//! Shared state for the edge proxy.

use std::time::Duration;

use anyhow::{Context, Result};

/// State shared by all proxy handlers.
///
/// Holds only the backend location and a pooled HTTP client; the proxy
/// keeps no per-session or per-user state.
#[derive(Clone)]
pub struct EdgeState {
    /// HTTP client used for all upstream calls.
    pub http: reqwest::Client,
    /// Base URL of the backend, without a trailing slash.
    pub backend_url: String,
}

impl EdgeState {
    /// Create proxy state pointed at the given backend.
    pub fn new(backend_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build upstream HTTP client")?;

        Ok(Self {
            http,
            backend_url: backend_url.trim_end_matches('/').to_string(),
        })
    }

    /// Absolute backend URL for a request path.
    pub fn backend(&self, path: &str) -> String {
        format!("{}{}", self.backend_url, path)
    }
}
