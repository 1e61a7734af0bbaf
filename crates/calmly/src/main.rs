//! Calmly backend server.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use calmly::activity::{ActivityRepository, ActivityService};
use calmly::api::{AppState, create_router};
use calmly::assistant::{AssistantEngine, HttpAssistantEngine, ScriptedEngine};
use calmly::chat::{ChatDb, ChatRepository, ChatService};
use calmly::notify::{EventNotifier, HttpEventNotifier, NullNotifier};
use calmly::settings::Settings;

#[derive(Parser, Debug)]
#[command(name = "calmly", about = "Calmly session and activity backend", version)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "CALMLY_CONFIG")]
    config: Option<PathBuf>,

    /// Override the bind port.
    #[arg(short, long)]
    port: Option<u16>,
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
        settings.server.port = port;
    }
    let server = settings.server;

    let db = ChatDb::open(std::path::Path::new(&server.database_path)).await?;
    info!(path = %server.database_path, "database ready");

    let engine_timeout = Duration::from_secs(server.engine_timeout_secs);
    let engine: Arc<dyn AssistantEngine> = match &server.assistant_url {
        Some(url) => {
            info!(%url, "using HTTP assistant engine");
            Arc::new(HttpAssistantEngine::new(url.clone(), engine_timeout)?)
        }
        None => {
            info!("no assistant engine configured, using scripted replies");
            Arc::new(ScriptedEngine::new())
        }
    };

    let notifier: Arc<dyn EventNotifier> = match &server.notifier_url {
        Some(url) => {
            info!(%url, "event notifier enabled");
            Arc::new(HttpEventNotifier::new(
                url.clone(),
                server.notifier_key.clone(),
                engine_timeout,
            )?)
        }
        None => Arc::new(NullNotifier),
    };

    let chat = ChatService::new(ChatRepository::new(db.clone()), engine);
    let activities = ActivityService::new(ActivityRepository::new(db.clone()), notifier);
    let app = create_router(AppState::new(chat, activities));

    let addr = format!("{}:{}", server.host, server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(%addr, "backend listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
