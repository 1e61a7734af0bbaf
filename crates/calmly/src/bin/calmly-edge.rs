//! Calmly edge proxy server.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use calmly::edge::{EdgeState, create_edge_router};
use calmly::settings::Settings;

#[derive(Parser, Debug)]
#[command(name = "calmly-edge", about = "Calmly edge proxy", version)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "CALMLY_CONFIG")]
    config: Option<PathBuf>,

    /// Override the bind port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the backend base URL.
    #[arg(long)]
    backend_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        settings.edge.port = port;
    }
    if let Some(backend_url) = cli.backend_url {
        settings.edge.backend_url = backend_url;
    }
    let edge = settings.edge;

    let state = EdgeState::new(
        &edge.backend_url,
        Duration::from_secs(edge.request_timeout_secs),
    )?;
    let app = create_edge_router(state, &edge.allowed_origins);

    let addr = format!("{}:{}", edge.host, edge.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(%addr, backend = %edge.backend_url, "edge proxy listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
