//! Conversational session storage and orchestration.
//!
//! A session is an ordered list of user/assistant messages owned by the
//! backend. Appends are serialized per session through a single write
//! transaction, so history retrieval always reflects append order.

mod db;
mod models;
mod repository;
mod service;

pub use db::ChatDb;
pub use models::{
    ChatMessage, CreateSessionResponse, MessageAnalysis, MessageMetadata, MessageRole,
    SendMessageRequest, SendMessageResponse, Session, SessionSummary,
};
pub use repository::ChatRepository;
pub use service::{ChatError, ChatService};
