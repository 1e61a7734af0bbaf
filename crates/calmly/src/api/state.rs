//! Application state shared across handlers.

use std::sync::Arc;

use crate::activity::ActivityService;
use crate::chat::ChatService;

/// Application state shared across all backend handlers.
#[derive(Clone)]
pub struct AppState {
    /// Session/History service.
    pub chat: Arc<ChatService>,
    /// Activity Log service.
    pub activities: Arc<ActivityService>,
}

impl AppState {
    /// Create new application state.
    pub fn new(chat: ChatService, activities: ActivityService) -> Self {
        Self {
            chat: Arc::new(chat),
            activities: Arc::new(activities),
        }
    }
}
