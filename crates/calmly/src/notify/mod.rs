//! Event notifier clients.
//!
//! The Event Notifier is an external collaborator informed of completed
//! activity writes. Dispatch is advisory: the Activity Log Service fires it
//! on a detached task and a failed notification never unwinds the write.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Result type for notifier operations.
pub type NotifyResult<T> = Result<T, NotifyError>;

/// Errors that can occur while delivering a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// HTTP request failed.
    #[error("notification request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Notifier answered with a non-success status.
    #[error("notifier returned status {0}")]
    Status(u16),
}

/// Payload describing a completed activity write.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityCompletedEvent {
    pub user_id: String,
    pub activity_id: String,
    #[serde(rename = "type")]
    pub activity_type: String,
    pub name: String,
    pub duration: i64,
    pub timestamp: DateTime<Utc>,
}

/// Sink for activity completion events.
#[async_trait]
pub trait EventNotifier: Send + Sync {
    async fn activity_completed(&self, event: &ActivityCompletedEvent) -> NotifyResult<()>;
}

#[derive(Debug, Serialize)]
struct EventEnvelope<'a> {
    name: &'static str,
    data: &'a ActivityCompletedEvent,
}

/// HTTP notifier posting events to an external event bus.
#[derive(Debug, Clone)]
pub struct HttpEventNotifier {
    client: Client,
    endpoint: String,
    event_key: Option<String>,
}

impl HttpEventNotifier {
    /// Create a new notifier client.
    pub fn new(
        endpoint: impl Into<String>,
        event_key: Option<String>,
        timeout: Duration,
    ) -> NotifyResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            event_key,
        })
    }
}

#[async_trait]
impl EventNotifier for HttpEventNotifier {
    async fn activity_completed(&self, event: &ActivityCompletedEvent) -> NotifyResult<()> {
        let mut request = self.client.post(&self.endpoint).json(&EventEnvelope {
            name: "activity/completed",
            data: event,
        });

        if let Some(key) = &self.event_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status(status.as_u16()));
        }

        Ok(())
    }
}

/// No-op notifier used when no event bus is configured.
#[derive(Debug, Default, Clone)]
pub struct NullNotifier;

#[async_trait]
impl EventNotifier for NullNotifier {
    async fn activity_completed(&self, _event: &ActivityCompletedEvent) -> NotifyResult<()> {
        Ok(())
    }
}
