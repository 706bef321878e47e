use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::storage::{KeyValueStorage, MemoryStorage};

/// Storage key holding the raw bearer token.
pub const TOKEN_KEY: &str = "token";

/// Accessor for the single bearer-token slot in client storage.
///
/// Cloning shares the underlying storage, so every clone observes the same slot.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn KeyValueStorage>,
    key: String,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self::with_key(storage, TOKEN_KEY)
    }

    pub fn with_key(storage: Arc<dyn KeyValueStorage>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    /// Store backed by fresh [`MemoryStorage`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn storage(&self) -> &Arc<dyn KeyValueStorage> {
        &self.storage
    }

    pub fn get(&self) -> Option<String> {
        self.storage.get(&self.key)
    }

    pub fn set(&self, token: &str) {
        self.storage.set(&self.key, token);
        debug!(key = %self.key, "stored bearer token");
    }

    /// Removes the slot. Clearing an empty slot is a no-op.
    pub fn clear(&self) {
        self.storage.remove(&self.key);
        debug!(key = %self.key, "cleared bearer token");
    }

    /// True when a non-empty token is stored.
    pub fn is_present(&self) -> bool {
        self.get().is_some_and(|token| !token.is_empty())
    }
}

impl fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenStore")
            .field("key", &self.key)
            .field("present", &self.is_present())
            .finish()
    }
}
