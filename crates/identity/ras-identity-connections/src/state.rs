//! Session-backed CSRF state for the authorization redirect.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, thread_rng};
use ras_identity_core::{Session, SessionResult};
use serde_json::{Map, Value};

const STATE_FIELD: &str = "state";
const STATE_TOKEN_BYTES: usize = 24;

/// Generate a random, URL-safe state token.
pub fn generate_state() -> String {
    let mut rng = thread_rng();
    let bytes: Vec<u8> = (0..STATE_TOKEN_BYTES).map(|_| rng.r#gen::<u8>()).collect();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Keeps at most one pending `state` in a JSON object stored under a single
/// session key.
#[derive(Debug, Clone)]
pub struct SessionStateStore {
    key: String,
}

impl SessionStateStore {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Record `state` as the pending value, replacing any earlier one.
    pub async fn store(&self, session: &dyn Session, state: &str) -> SessionResult<()> {
        let mut slot = match session.get(&self.key).await? {
            Some(Value::Object(slot)) => slot,
            _ => Map::new(),
        };
        slot.insert(STATE_FIELD.to_string(), Value::String(state.to_string()));
        session.insert(&self.key, Value::Object(slot)).await
    }

    /// Consume the pending state. The slot leaves the session in the same
    /// step; it is written back only if it still holds other fields.
    pub async fn take(&self, session: &dyn Session) -> SessionResult<Option<String>> {
        let Some(Value::Object(mut slot)) = session.remove(&self.key).await? else {
            return Ok(None);
        };

        let state = match slot.remove(STATE_FIELD) {
            Some(Value::String(state)) => Some(state),
            _ => None,
        };

        if !slot.is_empty() {
            session.insert(&self.key, Value::Object(slot)).await?;
        }

        Ok(state)
    }
}
