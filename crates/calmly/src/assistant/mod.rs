//! Assistant engine clients.
//!
//! Reply generation is owned by an external engine; this module only
//! defines the seam and the HTTP client for it. `ScriptedEngine` is a
//! deterministic stand-in used when no engine is configured and in tests.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use thiserror::Error;

use crate::chat::{ChatMessage, MessageMetadata};

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur while obtaining an assistant reply.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Engine could not be reached or timed out.
    #[error("assistant engine unavailable: {0}")]
    Unavailable(String),

    /// Engine answered with an error or an unusable body.
    #[error("assistant engine error: {0}")]
    Protocol(String),
}

/// A reply produced by the engine.
#[derive(Debug, Clone)]
pub struct EngineReply {
    pub content: String,
    pub metadata: Option<MessageMetadata>,
}

/// Source of assistant replies.
#[async_trait]
pub trait AssistantEngine: Send + Sync {
    /// Produce a reply to the latest user message, given the session's
    /// prior history.
    async fn reply(
        &self,
        session_id: &str,
        history: &[ChatMessage],
        content: &str,
    ) -> EngineResult<EngineReply>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EngineRequest<'a> {
    session_id: &'a str,
    message: &'a str,
    history: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct EngineResponse {
    response: Option<String>,
    message: Option<String>,
    metadata: Option<MessageMetadata>,
}

/// HTTP client for a remote assistant engine.
#[derive(Debug, Clone)]
pub struct HttpAssistantEngine {
    client: Client,
    base_url: String,
}

impl HttpAssistantEngine {
    /// Create a new engine client.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> EngineResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EngineError::Protocol(format!("building HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl AssistantEngine for HttpAssistantEngine {
    async fn reply(
        &self,
        session_id: &str,
        history: &[ChatMessage],
        content: &str,
    ) -> EngineResult<EngineReply> {
        let url = format!("{}/respond", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(&EngineRequest {
                session_id,
                message: content,
                history,
            })
            .send()
            .await
            .map_err(|e| EngineError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::Protocol(format!(
                "engine returned status {}",
                status
            )));
        }

        let body: EngineResponse = response
            .json()
            .await
            .map_err(|e| EngineError::Protocol(format!("parsing engine response: {}", e)))?;

        let content = body
            .response
            .or(body.message)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| EngineError::Protocol("engine returned an empty reply".to_string()))?;

        Ok(EngineReply {
            content,
            metadata: body.metadata,
        })
    }
}

const SCRIPTED_REPLIES: &[&str] = &[
    "Thank you for sharing that. What do you think is behind that feeling?",
    "That sounds difficult. How has this been affecting your day to day?",
    "I hear you. Would it help to walk through what happened step by step?",
    "Let's pause on that for a moment. What would feeling better look like for you?",
];

/// Deterministic engine that cycles through a fixed set of reflective
/// prompts. Never fails, never blocks.
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    next: AtomicUsize,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AssistantEngine for ScriptedEngine {
    async fn reply(
        &self,
        _session_id: &str,
        _history: &[ChatMessage],
        _content: &str,
    ) -> EngineResult<EngineReply> {
        let index = self.next.fetch_add(1, Ordering::Relaxed) % SCRIPTED_REPLIES.len();
        Ok(EngineReply {
            content: SCRIPTED_REPLIES[index].to_string(),
            metadata: Some(MessageMetadata {
                technique: "reflective listening".to_string(),
                goal: "open exploration".to_string(),
                progress: Vec::new(),
                analysis: None,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_engine_cycles() {
        let engine = ScriptedEngine::new();
        let first = engine.reply("s", &[], "hello").await.unwrap();
        let second = engine.reply("s", &[], "hello").await.unwrap();
        assert!(!first.content.is_empty());
        assert_ne!(first.content, second.content);
    }
}
