//! Mirrors game state into a key-value store.
//!
//! Storage problems never interrupt play: every failure is logged and the
//! caller carries on with its in-memory state.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use grammar_core::model::{
    AnswerSnapshot, CurrentQuestionState, ErrorState, ProgressState, SnapshotKey, StorageKeys,
};
use storage::repository::KeyValueStore;

/// The three state records as read back from storage.
///
/// Missing or unreadable records come back as `None`, or empty for the ledger.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredState {
    pub progress: Option<ProgressState>,
    pub current: Option<CurrentQuestionState>,
    pub errors: ErrorState,
}

/// JSON persistence for game state and per-question answer snapshots.
#[derive(Clone)]
pub struct StatePersistence {
    store: Arc<dyn KeyValueStore>,
    keys: StorageKeys,
    snapshot_limit: usize,
}

impl StatePersistence {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, keys: StorageKeys) -> Self {
        Self {
            store,
            keys,
            snapshot_limit: 100,
        }
    }

    #[must_use]
    pub fn with_snapshot_limit(mut self, limit: usize) -> Self {
        self.snapshot_limit = limit.max(1);
        self
    }

    #[must_use]
    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    //
    // ─── GENERIC RECORDS ───────────────────────────────────────────────────────
    //

    /// Serialize `value` under `key`. Returns whether the write went through.
    pub async fn save<T: Serialize + ?Sized + Sync>(&self, key: &str, value: &T) -> bool {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(key, error = %err, "failed to serialize state");
                return false;
            }
        };
        match self.store.set(key, &raw).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(key, error = %err, "failed to save state");
                false
            }
        }
    }

    /// Read the record under `key`; `None` when missing or unreadable.
    pub async fn load_optional<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!(key, error = %err, "failed to load state");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(key, error = %err, "ignoring malformed stored state");
                None
            }
        }
    }

    /// Read the record under `key`, falling back to `default`.
    pub async fn load<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.load_optional(key).await.unwrap_or(default)
    }

    /// Remove every key in `keys`, logging failures.
    pub async fn clear(&self, keys: &[&str]) {
        for key in keys {
            if let Err(err) = self.store.remove(key).await {
                tracing::warn!(key, error = %err, "failed to clear state");
            }
        }
    }

    //
    // ─── GAME STATE ────────────────────────────────────────────────────────────
    //

    /// Write all three state records. Returns whether every write succeeded.
    pub async fn save_state(
        &self,
        progress: &ProgressState,
        current: &CurrentQuestionState,
        errors: &ErrorState,
    ) -> bool {
        let progress_ok = self.save(&self.keys.progress, progress).await;
        let current_ok = self.save(&self.keys.answer, current).await;
        let errors_ok = self.save(&self.keys.errors, errors).await;
        progress_ok && current_ok && errors_ok
    }

    pub async fn load_state(&self) -> StoredState {
        StoredState {
            progress: self.load_optional(&self.keys.progress).await,
            current: self.load_optional(&self.keys.answer).await,
            errors: self.load(&self.keys.errors, ErrorState::new()).await,
        }
    }

    pub async fn clear_state(&self) {
        self.clear(&self.keys.state_keys()).await;
    }

    //
    // ─── ANSWER SNAPSHOTS ──────────────────────────────────────────────────────
    //

    fn snapshot_storage_key(&self, key: SnapshotKey) -> String {
        format!("{}{key}", self.keys.snapshot_prefix)
    }

    /// Store a snapshot, then trim old ones down to the limit.
    pub async fn save_snapshot(&self, key: SnapshotKey, snapshot: &AnswerSnapshot) -> bool {
        let saved = self.save(&self.snapshot_storage_key(key), snapshot).await;
        self.collect_garbage().await;
        saved
    }

    pub async fn load_snapshot(&self, key: SnapshotKey) -> Option<AnswerSnapshot> {
        self.load_optional(&self.snapshot_storage_key(key)).await
    }

    /// Every readable snapshot, ordered by storage key.
    pub async fn load_snapshots(&self) -> Vec<(SnapshotKey, AnswerSnapshot)> {
        let mut snapshots = Vec::new();
        for storage_key in self.snapshot_storage_keys().await {
            let Some(key) = self.parse_snapshot_key(&storage_key) else {
                continue;
            };
            if let Some(snapshot) = self.load_optional(&storage_key).await {
                snapshots.push((key, snapshot));
            }
        }
        snapshots
    }

    pub async fn remove_snapshot(&self, key: SnapshotKey) {
        let storage_key = self.snapshot_storage_key(key);
        self.clear(&[storage_key.as_str()]).await;
    }

    /// Remove all snapshots. Returns how many keys were targeted.
    pub async fn clear_snapshots(&self) -> usize {
        let keys = self.snapshot_storage_keys().await;
        let refs: Vec<&str> = keys.iter().map(String::as_str).collect();
        self.clear(&refs).await;
        keys.len()
    }

    /// Remove the oldest snapshots until at most the limit remain.
    ///
    /// Unreadable snapshots count as oldest. Returns how many were removed.
    pub async fn collect_garbage(&self) -> usize {
        let keys = self.snapshot_storage_keys().await;
        if keys.len() <= self.snapshot_limit {
            return 0;
        }

        let mut aged = Vec::with_capacity(keys.len());
        for storage_key in keys {
            let timestamp = self
                .load_optional::<AnswerSnapshot>(&storage_key)
                .await
                .map_or(i64::MIN, |snapshot| snapshot.timestamp);
            aged.push((timestamp, storage_key));
        }
        aged.sort();

        let excess = aged.len() - self.snapshot_limit;
        let doomed: Vec<&str> = aged[..excess].iter().map(|(_, key)| key.as_str()).collect();
        self.clear(&doomed).await;
        tracing::debug!(removed = excess, "collected old answer snapshots");
        excess
    }

    async fn snapshot_storage_keys(&self) -> Vec<String> {
        match self.store.keys_with_prefix(&self.keys.snapshot_prefix).await {
            Ok(keys) => keys,
            Err(err) => {
                tracing::warn!(error = %err, "failed to list answer snapshots");
                Vec::new()
            }
        }
    }

    fn parse_snapshot_key(&self, storage_key: &str) -> Option<SnapshotKey> {
        let raw = storage_key.strip_prefix(self.keys.snapshot_prefix.as_str())?;
        match raw.parse() {
            Ok(key) => Some(key),
            Err(err) => {
                tracing::warn!(key = storage_key, error = %err, "skipping unknown snapshot key");
                None
            }
        }
    }
}
