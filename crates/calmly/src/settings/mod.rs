//! Deployment configuration.
//!
//! Settings come from an optional TOML file with `CALMLY_`-prefixed
//! environment variables layered on top, e.g. `CALMLY_SERVER__PORT=9090`.

use std::path::Path;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

/// Backend server settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// SQLite database path.
    pub database_path: String,
    /// Base URL of the external assistant engine. When unset, the
    /// deterministic scripted engine is used.
    pub assistant_url: Option<String>,
    /// Event notifier endpoint. When unset, completion events are dropped.
    pub notifier_url: Option<String>,
    /// Optional bearer key for the notifier endpoint.
    pub notifier_key: Option<String>,
    /// Timeout for assistant engine calls, in seconds.
    pub engine_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database_path: "calmly.db".to_string(),
            assistant_url: None,
            notifier_url: None,
            notifier_key: None,
            engine_timeout_secs: 30,
        }
    }
}

/// Edge proxy settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EdgeSettings {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Base URL of the backend server.
    pub backend_url: String,
    /// Timeout for backend calls, in seconds.
    pub request_timeout_secs: u64,
    /// Origins allowed by the CORS layer.
    pub allowed_origins: Vec<String>,
}

impl Default for EdgeSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
            backend_url: "http://127.0.0.1:8080".to_string(),
            request_timeout_secs: 30,
            allowed_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

/// Top-level settings file layout.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub edge: EdgeSettings,
}

impl Settings {
    /// Load settings from an optional file plus `CALMLY_*` env overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        } else {
            builder = builder.add_source(File::with_name("calmly").required(false));
        }

        builder
            .add_source(Environment::with_prefix("CALMLY").separator("__"))
            .build()
            .context("failed to read configuration")?
            .try_deserialize()
            .context("invalid configuration")
    }
}
