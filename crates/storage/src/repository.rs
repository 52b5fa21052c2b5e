use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("storage quota exceeded: {needed} bytes needed, {available} available")]
    QuotaExceeded { needed: usize, available: usize },

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// String key to string value store; the only state shared between sessions.
///
/// Writes replace the whole value. Implementations must not partially apply a
/// failed write.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::QuotaExceeded` if the backend is full, or other
    /// storage errors.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// All keys starting with `prefix`, sorted.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError>;
}

/// Simple in-memory store for testing and prototyping.
///
/// An optional quota bounds the total bytes of keys plus values, the way a
/// browser bounds local storage.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
    quota: Option<usize>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that refuses writes beyond `bytes` of total key and value size.
    #[must_use]
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(BTreeMap::new())),
            quota: Some(bytes),
        }
    }

    /// Number of stored keys.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn len(&self) -> Result<usize, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.len())
    }

    /// True if nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if let Some(quota) = self.quota {
            let used: usize = guard
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = key.len() + value.len();
            let available = quota.saturating_sub(used);
            if needed > available {
                return Err(StorageError::QuotaExceeded { needed, available });
            }
        }
        guard.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(key);
        Ok(())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .range(prefix.to_owned()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }
}

/// The store behind a trait object for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub kv: Arc<dyn KeyValueStore>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            kv: Arc::new(InMemoryStore::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_remove_round_trip() {
        let store = InMemoryStore::new();
        assert_eq!(store.get("k").await.unwrap(), None);

        store.set("k", "v1").await.unwrap();
        store.set("k", "v2").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v2"));
        assert_eq!(store.len().unwrap(), 1);

        store.remove("k").await.unwrap();
        store.remove("k").await.unwrap();
        assert!(store.is_empty().unwrap());
    }

    #[tokio::test]
    async fn keys_with_prefix_filters_and_sorts() {
        let store = InMemoryStore::new();
        for key in ["snap:b", "other", "snap:a", "snapshot"] {
            store.set(key, "x").await.unwrap();
        }
        let keys = store.keys_with_prefix("snap:").await.unwrap();
        assert_eq!(keys, vec!["snap:a".to_owned(), "snap:b".to_owned()]);
    }

    #[tokio::test]
    async fn quota_rejects_oversized_writes_without_side_effects() {
        let store = InMemoryStore::with_quota(10);
        store.set("ab", "cdef").await.unwrap();

        let err = store.set("xy", "0123456").await.unwrap_err();
        assert!(matches!(
            err,
            StorageError::QuotaExceeded { needed: 9, available: 4 }
        ));
        assert_eq!(store.get("xy").await.unwrap(), None);

        // Overwriting frees the old value first.
        store.set("ab", "cdefghij").await.unwrap();
        assert_eq!(store.get("ab").await.unwrap().as_deref(), Some("cdefghij"));
    }

    #[tokio::test]
    async fn storage_in_memory_is_usable_through_trait_object() {
        let storage = Storage::in_memory();
        storage.kv.set("a", "1").await.unwrap();
        assert_eq!(storage.kv.get("a").await.unwrap().as_deref(), Some("1"));
    }
}
