//! Named persisted state.
//!
//! [`PersistentState`] is object-safe and moves JSON values; the typed
//! `save`/`retrieve` helpers live on [`PersistentStateExt`], which every
//! implementation gets for free.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Result type for state operations.
pub type StateResult<T> = Result<T, StateError>;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("state not found: {0}")]
    NotFound(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("backend error: {0}")]
    Backend(String),
}

/// Reads and writes named state objects.
pub trait PersistentState: Send + Sync {
    /// Persist a value under `name`, replacing any previous value.
    fn save_value(&self, name: &str, state: serde_json::Value) -> StateResult<()>;

    /// Load the value previously saved under `name`.
    fn retrieve_value(&self, name: &str) -> StateResult<serde_json::Value>;
}

/// Typed access on top of [`PersistentState`].
pub trait PersistentStateExt: PersistentState {
    fn save<T>(&self, name: &str, state: &T) -> StateResult<()>
    where
        T: Serialize + ?Sized,
    {
        self.save_value(name, serde_json::to_value(state)?)
    }

    fn retrieve<T>(&self, name: &str) -> StateResult<T>
    where
        T: DeserializeOwned,
    {
        Ok(serde_json::from_value(self.retrieve_value(name)?)?)
    }
}

impl<S: PersistentState + ?Sized> PersistentStateExt for S {}

/// In-memory state store.
#[derive(Debug, Default)]
pub struct MemoryState {
    entries: RwLock<HashMap<String, serde_json::Value>>,
}

impl MemoryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names currently stored, unordered.
    pub fn names(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }
}

impl PersistentState for MemoryState {
    fn save_value(&self, name: &str, state: serde_json::Value) -> StateResult<()> {
        self.entries.write().insert(name.to_string(), state);
        Ok(())
    }

    fn retrieve_value(&self, name: &str) -> StateResult<serde_json::Value> {
        self.entries
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| StateError::NotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::sync::Arc;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Cursor {
        partition: u32,
        offset: u64,
    }

    #[test]
    fn test_typed_save_and_retrieve() {
        let state = MemoryState::new();
        let cursor = Cursor {
            partition: 3,
            offset: 1_024,
        };

        state.save("cursor", &cursor).unwrap();
        let loaded: Cursor = state.retrieve("cursor").unwrap();
        assert_eq!(loaded, cursor);
        assert_eq!(state.names(), vec!["cursor".to_string()]);
    }

    #[test]
    fn test_missing_state() {
        let state: Arc<dyn PersistentState> = Arc::new(MemoryState::new());
        let err = state.retrieve::<Cursor>("absent").unwrap_err();
        assert!(matches!(err, StateError::NotFound(name) if name == "absent"));
    }

    #[test]
    fn test_shape_mismatch_is_serialization_error() {
        let state = MemoryState::new();
        state.save("cursor", &"not a cursor").unwrap();

        let err = state.retrieve::<Cursor>("cursor").unwrap_err();
        assert!(matches!(err, StateError::Serialization(_)));
    }

    #[test]
    fn test_save_overwrites() {
        let state = MemoryState::new();
        state.save("n", &1u32).unwrap();
        state.save("n", &2u32).unwrap();
        assert_eq!(state.retrieve::<u32>("n").unwrap(), 2);
    }
}
