//! Bearer token storage.

use std::sync::{Arc, RwLock};

/// Injectable holder for the caller's opaque bearer token.
///
/// Cheap to clone; all clones observe the same token. Purely in-memory,
/// never blocks on I/O.
#[derive(Clone, Default)]
pub struct TokenStore {
    inner: Arc<RwLock<Option<String>>>,
}

impl TokenStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-loaded with a token.
    pub fn with_token(token: impl Into<String>) -> Self {
        let store = Self::new();
        store.set(token);
        store
    }

    /// Current token, if any.
    pub fn get(&self) -> Option<String> {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Replace the stored token.
    pub fn set(&self, token: impl Into<String>) {
        *self.inner.write().unwrap_or_else(|e| e.into_inner()) = Some(token.into());
    }

    /// Forget the stored token.
    pub fn clear(&self) {
        *self.inner.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_by_default() {
        let store = TokenStore::new();
        assert!(store.get().is_none());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_set_get_clear() {
        let store = TokenStore::new();
        store.set("tok-1");
        assert_eq!(store.get().as_deref(), Some("tok-1"));
        assert!(store.is_authenticated());
        store.clear();
        assert!(store.get().is_none());
    }

    #[test]
    fn test_clones_share_state() {
        let store = TokenStore::with_token("shared");
        let clone = store.clone();
        store.set("replaced");
        assert_eq!(clone.get().as_deref(), Some("replaced"));
        clone.clear();
        assert!(!store.is_authenticated());
    }
}
