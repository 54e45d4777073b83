//! Keyed session storage handed to strategies by the host application.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session store unavailable: {0}")]
    Unavailable(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Per-user session attached to a request.
///
/// `remove` doubles as the "take" primitive: it must read and delete a key in
/// one step, so two concurrent callers never both observe the same value.
#[async_trait]
pub trait Session: Send + Sync {
    async fn get(&self, key: &str) -> SessionResult<Option<Value>>;

    async fn insert(&self, key: &str, value: Value) -> SessionResult<()>;

    /// Remove a key, returning the value it held.
    async fn remove(&self, key: &str) -> SessionResult<Option<Value>>;
}

/// Session backed by a process-local map.
#[derive(Clone, Default)]
pub struct InMemorySession {
    values: Arc<RwLock<HashMap<String, Value>>>,
}

impl InMemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn is_empty(&self) -> bool {
        self.values.read().await.is_empty()
    }

    pub async fn contains_key(&self, key: &str) -> bool {
        self.values.read().await.contains_key(key)
    }
}

#[async_trait]
impl Session for InMemorySession {
    async fn get(&self, key: &str) -> SessionResult<Option<Value>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn insert(&self, key: &str, value: Value) -> SessionResult<()> {
        self.values.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> SessionResult<Option<Value>> {
        Ok(self.values.write().await.remove(key))
    }
}
