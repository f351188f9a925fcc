//! In-memory history store.

use std::sync::Mutex;

use async_trait::async_trait;

use sora_models::{HistoryEntry, HistoryFile};

use crate::error::HistoryResult;
use crate::store::HistoryStore;

/// Keeps history in process memory with the same eviction rules as the file store.
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    inner: Mutex<HistoryFile>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with entries already in most-recent-first order.
    pub fn with_entries(entries: Vec<HistoryEntry>) -> Self {
        Self {
            inner: Mutex::new(HistoryFile { videos: entries }),
        }
    }

    /// Snapshot of the current entries.
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.lock().videos.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HistoryFile> {
        // a poisoned lock still holds a consistent list
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn load(&self) -> HistoryResult<Vec<HistoryEntry>> {
        Ok(self.entries())
    }

    async fn append(&self, entry: HistoryEntry) -> HistoryResult<()> {
        self.lock().push_front(entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sora_models::MAX_HISTORY_ENTRIES;

    #[tokio::test]
    async fn test_append_evicts_oldest() {
        let store = MemoryHistoryStore::new();
        for i in 0..=MAX_HISTORY_ENTRIES {
            store
                .append(HistoryEntry::new(format!("video_{}", i), "p", "sora-2"))
                .await
                .unwrap();
        }

        let entries = store.load().await.unwrap();
        assert_eq!(entries.len(), MAX_HISTORY_ENTRIES);
        assert_eq!(entries[0].id, format!("video_{}", MAX_HISTORY_ENTRIES));
        assert!(entries.iter().all(|e| e.id != "video_0"));
    }

    #[tokio::test]
    async fn test_resolve_uses_loaded_entries() {
        let store = MemoryHistoryStore::with_entries(vec![
            HistoryEntry::new("video_new", "p", "sora-2"),
            HistoryEntry::new("video_old", "p", "sora-2"),
        ]);
        assert_eq!(store.resolve("@last").await.unwrap(), "video_new");
        assert_eq!(store.resolve("@1").await.unwrap(), "video_old");
    }
}
