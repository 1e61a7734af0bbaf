//! Chat service - session lifecycle and message exchange.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::assistant::{AssistantEngine, EngineError};

use super::models::{ChatMessage, MessageRole, SendMessageResponse, Session, SessionSummary};
use super::repository::ChatRepository;

/// Errors surfaced by chat operations.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Message content must not be empty")]
    EmptyMessage,

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Service for managing conversation sessions.
#[derive(Clone)]
pub struct ChatService {
    repo: ChatRepository,
    engine: Arc<dyn AssistantEngine>,
}

impl ChatService {
    /// Create a new chat service.
    pub fn new(repo: ChatRepository, engine: Arc<dyn AssistantEngine>) -> Self {
        Self { repo, engine }
    }

    /// Create a new empty session with a fresh unique id.
    pub async fn create_session(&self, user_id: &str) -> Result<Session, ChatError> {
        let session_id = Uuid::new_v4().to_string();
        let session = self.repo.create(user_id, &session_id).await?;
        info!(session_id = %session.session_id, "created chat session");
        Ok(session)
    }

    /// List the user's sessions, most recently updated first.
    pub async fn list_sessions(&self, user_id: &str) -> Result<Vec<SessionSummary>, ChatError> {
        Ok(self.repo.list(user_id).await?)
    }

    /// Fetch a single session with its messages.
    pub async fn get_session(&self, user_id: &str, session_id: &str) -> Result<Session, ChatError> {
        self.repo
            .get(user_id, session_id)
            .await?
            .ok_or_else(|| ChatError::SessionNotFound(session_id.to_string()))
    }

    /// Fetch the full ordered message history.
    pub async fn history(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Vec<ChatMessage>, ChatError> {
        self.repo
            .history(user_id, session_id)
            .await?
            .ok_or_else(|| ChatError::SessionNotFound(session_id.to_string()))
    }

    /// Exchange one message turn: append the user message, obtain the
    /// assistant reply, append it, and return the reply.
    ///
    /// The user message is kept even when the engine fails, so the history
    /// reflects what the user actually sent.
    pub async fn send_message(
        &self,
        user_id: &str,
        session_id: &str,
        content: &str,
    ) -> Result<SendMessageResponse, ChatError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let history = self
            .repo
            .history(user_id, session_id)
            .await?
            .ok_or_else(|| ChatError::SessionNotFound(session_id.to_string()))?;

        self.repo
            .append_message(user_id, session_id, MessageRole::User, content, None)
            .await?
            .ok_or_else(|| ChatError::SessionNotFound(session_id.to_string()))?;

        let reply = match self.engine.reply(session_id, &history, content).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "assistant engine call failed");
                return Err(e.into());
            }
        };

        self.repo
            .append_message(
                user_id,
                session_id,
                MessageRole::Assistant,
                &reply.content,
                reply.metadata.as_ref(),
            )
            .await?
            .ok_or_else(|| ChatError::SessionNotFound(session_id.to_string()))?;

        Ok(SendMessageResponse {
            response: reply.content,
            metadata: reply.metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::ScriptedEngine;
    use crate::chat::ChatDb;

    async fn setup() -> ChatService {
        let db = ChatDb::in_memory().await.unwrap();
        ChatService::new(ChatRepository::new(db), Arc::new(ScriptedEngine::new()))
    }

    #[tokio::test]
    async fn test_create_yields_distinct_ids() {
        let service = setup().await;
        let a = service.create_session("user-1").await.unwrap();
        let b = service.create_session("user-1").await.unwrap();
        assert_ne!(a.session_id, b.session_id);
    }

    #[tokio::test]
    async fn test_send_message_appends_both_turns() {
        let service = setup().await;
        let session = service.create_session("user-1").await.unwrap();

        let response = service
            .send_message("user-1", &session.session_id, "I feel anxious")
            .await
            .unwrap();
        assert!(!response.response.is_empty());

        let history = service
            .history("user-1", &session.session_id)
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, MessageRole::User);
        assert_eq!(history[0].content, "I feel anxious");
        assert_eq!(history[1].role, MessageRole::Assistant);
        assert!(!history[1].content.is_empty());
    }

    #[tokio::test]
    async fn test_send_message_trims_and_rejects_empty() {
        let service = setup().await;
        let session = service.create_session("user-1").await.unwrap();

        let err = service
            .send_message("user-1", &session.session_id, "   \n ")
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::EmptyMessage));

        // Nothing was appended
        let history = service
            .history("user-1", &session.session_id)
            .await
            .unwrap();
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn test_send_message_unknown_session() {
        let service = setup().await;
        let err = service
            .send_message("user-1", "missing", "hello")
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::SessionNotFound(_)));
    }
}
