//! Optimistic local conversation state.
//!
//! The client mirrors each session as an ordered list of messages with a
//! delivery state, so a UI can render an outgoing message immediately and
//! reconcile it once the server answers.

use std::collections::HashMap;

use chrono::Utc;

use crate::chat::{ChatMessage, MessageRole, SessionSummary};

/// Delivery state of a locally tracked message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryState {
    /// Sent, not yet acknowledged by the server.
    Pending,
    /// Acknowledged by the server.
    Committed,
    /// The send failed; the message was not recorded server-side.
    Failed,
}

/// A message as the client currently sees it.
#[derive(Debug, Clone)]
pub struct LocalMessage {
    pub role: MessageRole,
    pub content: String,
    pub state: DeliveryState,
}

/// Ordered local mirror of one session.
#[derive(Debug, Clone, Default)]
pub struct SessionView {
    pub messages: Vec<LocalMessage>,
}

impl SessionView {
    /// Messages still awaiting server acknowledgement.
    pub fn pending_count(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.state == DeliveryState::Pending)
            .count()
    }
}

/// Handle for one in-flight send, returned by [`ConversationView::begin_send`].
#[derive(Debug, Clone, Copy)]
pub struct SendTicket {
    index: usize,
}

/// The client's cached picture of the caller's conversations.
#[derive(Debug, Default)]
pub struct ConversationView {
    summaries: Vec<SessionSummary>,
    sessions: HashMap<String, SessionView>,
}

impl ConversationView {
    /// Start tracking a freshly created session.
    pub fn track_session(&mut self, session_id: &str) {
        self.sessions
            .entry(session_id.to_string())
            .or_default();
        if !self.summaries.iter().any(|s| s.session_id == session_id) {
            let now = Utc::now();
            self.summaries.insert(
                0,
                SessionSummary {
                    session_id: session_id.to_string(),
                    created_at: now,
                    updated_at: now,
                    message_count: 0,
                },
            );
        }
    }

    /// Replace the cached summaries with a server-fetched list.
    pub fn replace_summaries(&mut self, summaries: Vec<SessionSummary>) {
        self.summaries = summaries;
    }

    /// Replace a session's local messages with server history.
    pub fn replace_history(&mut self, session_id: &str, history: &[ChatMessage]) {
        let view = self.sessions.entry(session_id.to_string()).or_default();
        view.messages = history
            .iter()
            .map(|m| LocalMessage {
                role: m.role,
                content: m.content.clone(),
                state: DeliveryState::Committed,
            })
            .collect();
    }

    /// Append an outgoing user message as pending.
    pub fn begin_send(&mut self, session_id: &str, content: &str) -> SendTicket {
        let view = self.sessions.entry(session_id.to_string()).or_default();
        view.messages.push(LocalMessage {
            role: MessageRole::User,
            content: content.to_string(),
            state: DeliveryState::Pending,
        });
        SendTicket {
            index: view.messages.len() - 1,
        }
    }

    /// Mark a send acknowledged and append the assistant's reply.
    ///
    /// The affected session's cached summary is adjusted in place rather
    /// than refetching the whole list.
    pub fn commit_send(&mut self, session_id: &str, ticket: SendTicket, reply: &str) {
        if let Some(view) = self.sessions.get_mut(session_id) {
            if let Some(message) = view.messages.get_mut(ticket.index) {
                message.state = DeliveryState::Committed;
            }
            view.messages.push(LocalMessage {
                role: MessageRole::Assistant,
                content: reply.to_string(),
                state: DeliveryState::Committed,
            });
        }

        if let Some(pos) = self
            .summaries
            .iter()
            .position(|s| s.session_id == session_id)
        {
            let mut summary = self.summaries.remove(pos);
            summary.message_count += 2;
            summary.updated_at = Utc::now();
            // List stays ordered by recency without a refetch.
            self.summaries.insert(0, summary);
        }
    }

    /// Mark a send as failed; the message stays visible for retry.
    pub fn fail_send(&mut self, session_id: &str, ticket: SendTicket) {
        if let Some(view) = self.sessions.get_mut(session_id) {
            if let Some(message) = view.messages.get_mut(ticket.index) {
                message.state = DeliveryState::Failed;
            }
        }
    }

    pub fn session(&self, session_id: &str) -> Option<&SessionView> {
        self.sessions.get(session_id)
    }

    pub fn summaries(&self) -> &[SessionSummary] {
        &self.summaries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_appends_reply_and_bumps_summary() {
        let mut view = ConversationView::default();
        view.track_session("s1");

        let ticket = view.begin_send("s1", "hello");
        assert_eq!(view.session("s1").unwrap().pending_count(), 1);

        view.commit_send("s1", ticket, "hi there");
        let session = view.session("s1").unwrap();
        assert_eq!(session.pending_count(), 0);
        assert_eq!(session.messages.len(), 2);
        assert_eq!(session.messages[0].state, DeliveryState::Committed);
        assert_eq!(session.messages[1].role, MessageRole::Assistant);
        assert_eq!(view.summaries()[0].message_count, 2);
    }

    #[test]
    fn test_failed_send_keeps_message_visible() {
        let mut view = ConversationView::default();
        view.track_session("s1");

        let ticket = view.begin_send("s1", "hello");
        view.fail_send("s1", ticket);

        let session = view.session("s1").unwrap();
        assert_eq!(session.messages.len(), 1);
        assert_eq!(session.messages[0].state, DeliveryState::Failed);
        assert_eq!(view.summaries()[0].message_count, 0);
    }

    #[test]
    fn test_committed_session_moves_to_front() {
        let mut view = ConversationView::default();
        view.track_session("older");
        view.track_session("newer");
        assert_eq!(view.summaries()[0].session_id, "newer");

        let ticket = view.begin_send("older", "ping");
        view.commit_send("older", ticket, "pong");
        assert_eq!(view.summaries()[0].session_id, "older");
    }

    #[test]
    fn test_history_replaces_local_state() {
        let mut view = ConversationView::default();
        view.track_session("s1");
        let ticket = view.begin_send("s1", "lost");
        view.fail_send("s1", ticket);

        let history = vec![ChatMessage {
            role: MessageRole::User,
            content: "kept".to_string(),
            timestamp: Utc::now(),
            metadata: None,
        }];
        view.replace_history("s1", &history);

        let session = view.session("s1").unwrap();
        assert_eq!(session.messages.len(), 1);
        assert_eq!(session.messages[0].content, "kept");
        assert_eq!(session.messages[0].state, DeliveryState::Committed);
    }
}
