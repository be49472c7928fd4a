//! Alert-state persistence

use std::collections::HashSet;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::domain::alert::AlertKey;
use crate::shared::errors::PersistenceError;

/// Durable storage for the armed alert set. Save replaces the whole set.
#[async_trait]
pub trait AlertStateStore: Send + Sync {
    async fn load(&self) -> Result<HashSet<AlertKey>, PersistenceError>;
    async fn save(&self, state: &HashSet<AlertKey>) -> Result<(), PersistenceError>;
}

/// One JSON document on disk holding the armed alert keys
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl AlertStateStore for JsonStateStore {
    async fn load(&self) -> Result<HashSet<AlertKey>, PersistenceError> {
        if !self.path.exists() {
            debug!(
                "No alert state file at {}, starting empty",
                self.path.display()
            );
            return Ok(HashSet::new());
        }
        let content = tokio::fs::read_to_string(&self.path).await?;
        let keys: Vec<AlertKey> = serde_json::from_str(&content)?;
        info!(
            "Loaded {} alert state(s) from {}",
            keys.len(),
            self.path.display()
        );
        Ok(keys.into_iter().collect())
    }

    async fn save(&self, state: &HashSet<AlertKey>) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        // Sorted so the file diffs cleanly between saves.
        let mut keys: Vec<&AlertKey> = state.iter().collect();
        keys.sort_by(|a, b| {
            (&a.symbol, a.threshold_pct).cmp(&(&b.symbol, b.threshold_pct))
        });
        let content = serde_json::to_string_pretty(&keys)?;
        tokio::fs::write(&self.path, content).await?;
        debug!(
            "Saved {} alert state(s) to {}",
            state.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// Volatile store for tests and ephemeral runs
#[derive(Default)]
pub struct MemoryStateStore {
    state: Mutex<HashSet<AlertKey>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed(&self, keys: HashSet<AlertKey>) {
        *self.state.lock().await = keys;
    }
}

#[async_trait]
impl AlertStateStore for MemoryStateStore {
    async fn load(&self) -> Result<HashSet<AlertKey>, PersistenceError> {
        Ok(self.state.lock().await.clone())
    }

    async fn save(&self, state: &HashSet<AlertKey>) -> Result<(), PersistenceError> {
        *self.state.lock().await = state.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_state_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "indexwatch-test-{}-{}.json",
            tag,
            std::process::id()
        ))
    }

    #[tokio::test]
    async fn test_json_store_round_trip() {
        let path = temp_state_path("round-trip");
        let store = JsonStateStore::new(&path);

        let mut state = HashSet::new();
        state.insert(AlertKey::new("^GSPC", 5));
        state.insert(AlertKey::new("^NDX", 10));
        store.save(&state).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, state);

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_json_store_save_replaces_whole_set() {
        let path = temp_state_path("replace");
        let store = JsonStateStore::new(&path);

        let mut first = HashSet::new();
        first.insert(AlertKey::new("^GSPC", 5));
        first.insert(AlertKey::new("^GSPC", 10));
        store.save(&first).await.unwrap();

        let mut second = HashSet::new();
        second.insert(AlertKey::new("^NDX", 20));
        store.save(&second).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, second);

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_json_store_missing_file_loads_empty() {
        let store = JsonStateStore::new(temp_state_path("missing-never-created"));
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryStateStore::new();
        let mut state = HashSet::new();
        state.insert(AlertKey::new("^GSPC", 15));
        store.save(&state).await.unwrap();
        assert_eq!(store.load().await.unwrap(), state);
    }
}
