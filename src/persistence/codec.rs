use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use super::store::{KeyValueStore, StoreError};

/// Failures while reading or writing a persisted placeholder.
///
/// These never reach the caller mutating a [`Loadable`](crate::loaded::Loadable): persistence
/// is a cache, so they are logged and the operation goes on without it.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Failed to encode placeholder for '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to decode placeholder stored under '{key}': {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Write side of placeholder persistence, with the value type's serializer baked in.
///
/// `Loadable<V, E>` holds one as a trait object, so only the constructor attaching it needs
/// `V: Serialize`.
pub(crate) trait PlaceholderSink<V>: Send + Sync {
    fn key(&self) -> &str;
    fn write(&self, value: &V) -> Result<(), PersistenceError>;
}

/// Stores placeholders as JSON documents under a single key.
pub(crate) struct JsonSink<S> {
    key: String,
    store: S,
}

impl<S: KeyValueStore> JsonSink<S> {
    pub(crate) fn new(key: String, store: S) -> Self {
        Self { key, store }
    }

    pub(crate) fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn read<V: DeserializeOwned>(&self) -> Result<Option<V>, PersistenceError> {
        let Some(bytes) = self.store.get(&self.key)? else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| PersistenceError::Decode {
                key: self.key.clone(),
                source,
            })
    }
}

impl<V: Serialize, S: KeyValueStore> PlaceholderSink<V> for JsonSink<S> {
    fn key(&self) -> &str {
        &self.key
    }

    fn write(&self, value: &V) -> Result<(), PersistenceError> {
        let bytes = serde_json::to_vec(value).map_err(|source| PersistenceError::Encode {
            key: self.key.clone(),
            source,
        })?;
        self.store.set(&self.key, bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[derive(Debug, PartialEq, Serialize, serde::Deserialize)]
    struct Profile {
        name: String,
        age: u8,
    }

    #[test]
    fn write_then_read() {
        let store = MemoryStore::new();
        let sink = JsonSink::new("profile".to_owned(), store.clone());
        let profile = Profile {
            name: "Ada".to_owned(),
            age: 36,
        };

        PlaceholderSink::write(&sink, &profile).unwrap();
        assert_eq!(
            store.get("profile").unwrap(),
            Some(br#"{"name":"Ada","age":36}"#.to_vec())
        );
        assert_eq!(sink.read::<Profile>().unwrap(), Some(profile));
    }

    #[test]
    fn missing_entry_reads_as_none() {
        let sink = JsonSink::new("profile".to_owned(), MemoryStore::new());
        assert!(sink.read::<Profile>().unwrap().is_none());
    }

    #[test]
    fn corrupted_entry_is_a_decode_error() {
        let store = MemoryStore::new();
        store.set("profile", b"not json".to_vec()).unwrap();
        let sink = JsonSink::new("profile".to_owned(), store);
        assert!(matches!(
            sink.read::<Profile>(),
            Err(PersistenceError::Decode { .. })
        ));
    }
}
