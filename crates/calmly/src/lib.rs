//! Calmly backend library.
//!
//! Provides the conversational session subsystem: the Session/History
//! Service and Activity Log Service (served by the `calmly` binary), the
//! Edge Proxy tier (`calmly-edge` binary), and the Conversation Client used
//! by frontends and tools.

pub mod activity;
pub mod api;
pub mod assistant;
pub mod auth;
pub mod chat;
pub mod client;
pub mod edge;
pub mod notify;
pub mod settings;
