//! Conversation client.
//!
//! Talks to the edge proxy, normalizes its failures into [`ClientError`]
//! and keeps an optimistic local view of each conversation.

mod error;
mod token;
mod view;

pub use error::{ClientError, ClientResult};
pub use token::TokenStore;
pub use view::{ConversationView, DeliveryState, LocalMessage, SendTicket, SessionView};

use std::sync::Mutex;
use std::time::Duration;

use reqwest::header;
use tracing::debug;

use crate::api::normalize_error_message;
use crate::chat::{ChatMessage, CreateSessionResponse, SendMessageResponse, SessionSummary};

/// Client for the conversation and activity API behind the edge proxy.
pub struct ConversationClient {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenStore,
    view: Mutex<ConversationView>,
}

impl ConversationClient {
    /// Create a client against the given proxy base URL.
    pub fn new(base_url: &str, tokens: TokenStore, timeout: Duration) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
            view: Mutex::new(ConversationView::default()),
        })
    }

    /// The token store backing this client.
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Start a new conversation session.
    pub async fn create_session(&self) -> ClientResult<String> {
        let token = self.require_token()?;

        let response = self
            .http
            .post(self.url("/chat"))
            .header(header::AUTHORIZATION, bearer(&token))
            .send()
            .await?;
        let created: CreateSessionResponse = self
            .parse(response, "Failed to create chat session")
            .await?;

        self.with_view(|view| view.track_session(&created.session_id));
        Ok(created.session_id)
    }

    /// List the caller's sessions, most recently updated first.
    ///
    /// Without a token this is an empty list, not an error, and no request
    /// is made.
    pub async fn list_sessions(&self) -> ClientResult<Vec<SessionSummary>> {
        let Some(token) = self.tokens.get() else {
            debug!("no token present, returning empty session list");
            return Ok(Vec::new());
        };

        let response = self
            .http
            .get(self.url("/chat/sessions"))
            .header(header::AUTHORIZATION, bearer(&token))
            .send()
            .await?;
        let summaries: Vec<SessionSummary> = self
            .parse(response, "Failed to fetch chat sessions")
            .await?;

        self.with_view(|view| view.replace_summaries(summaries.clone()));
        Ok(summaries)
    }

    /// Send a message and return the assistant's reply.
    ///
    /// The outgoing message is tracked locally as pending before the
    /// request goes out, committed on success and marked failed otherwise.
    pub async fn send_message(
        &self,
        session_id: &str,
        content: &str,
    ) -> ClientResult<SendMessageResponse> {
        let token = self.require_token()?;
        let content = content.trim();
        if content.is_empty() {
            return Err(ClientError::Validation("Message is required".to_string()));
        }

        let ticket = self.with_view(|view| view.begin_send(session_id, content));

        let result = self
            .http
            .post(self.url(&format!("/chat/sessions/{}", session_id)))
            .header(header::AUTHORIZATION, bearer(&token))
            .json(&serde_json::json!({ "message": content }))
            .send()
            .await
            .map_err(ClientError::from);

        let reply: ClientResult<SendMessageResponse> = match result {
            Ok(response) => self.parse(response, "Failed to process chat message").await,
            Err(err) => Err(err),
        };

        match reply {
            Ok(reply) => {
                self.with_view(|view| view.commit_send(session_id, ticket, &reply.response));
                Ok(reply)
            }
            Err(err) => {
                self.with_view(|view| view.fail_send(session_id, ticket));
                Err(err)
            }
        }
    }

    /// Fetch the ordered history for a session and refresh the local view.
    pub async fn get_history(&self, session_id: &str) -> ClientResult<Vec<ChatMessage>> {
        let token = self.require_token()?;

        let response = self
            .http
            .get(self.url(&format!("/chat/sessions/{}/history", session_id)))
            .header(header::AUTHORIZATION, bearer(&token))
            .send()
            .await?;
        let history: Vec<ChatMessage> = self.parse(response, "Failed to fetch chat history").await?;

        self.with_view(|view| view.replace_history(session_id, &history));
        Ok(history)
    }

    /// Snapshot of the local view for one session.
    pub fn session_view(&self, session_id: &str) -> Option<SessionView> {
        self.with_view(|view| view.session(session_id).cloned())
    }

    /// Snapshot of the cached session summaries.
    pub fn cached_summaries(&self) -> Vec<SessionSummary> {
        self.with_view(|view| view.summaries().to_vec())
    }

    fn require_token(&self) -> ClientResult<String> {
        self.tokens.get().ok_or(ClientError::AuthenticationRequired)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn with_view<T>(&self, f: impl FnOnce(&mut ConversationView) -> T) -> T {
        let mut view = self.view.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut view)
    }

    /// Deserialize a success body or normalize the failure.
    async fn parse<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
        fallback: &str,
    ) -> ClientResult<T> {
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let message = normalize_error_message(
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown"),
                content_type.as_deref(),
                &bytes,
                fallback,
            );
            return Err(ClientError::from_status(status.as_u16(), message));
        }

        serde_json::from_slice(&bytes)
            .map_err(|e| ClientError::Transport(format!("malformed response body: {}", e)))
    }
}

fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}
