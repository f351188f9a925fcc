//! History persisted as a single JSON document.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use sora_models::{HistoryEntry, HistoryFile};

use crate::error::{HistoryError, HistoryResult};
use crate::store::HistoryStore;

/// `$HOME/.sora-cli/history.json`.
pub fn default_history_path() -> HistoryResult<PathBuf> {
    let home = std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .filter(|h| !h.is_empty())
        .ok_or(HistoryError::NoHomeDirectory)?;
    Ok(PathBuf::from(home).join(".sora-cli").join("history.json"))
}

/// File-backed store. Every append rewrites the whole document.
///
/// Two processes appending at once can lose an entry; within one process
/// there is a single writer.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default user-scoped path.
    pub fn user_default() -> HistoryResult<Self> {
        Ok(Self::new(default_history_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_file(&self) -> HistoryResult<HistoryFile> {
        let data = match fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(HistoryFile::default());
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_slice(&data).map_err(|source| HistoryError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    async fn write_file(&self, file: &HistoryFile) -> HistoryResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await?;
            }
        }

        let data = serde_json::to_vec_pretty(file)?;
        let tmp = self.path.with_extension("json.tmp");

        fs::write(&tmp, &data).await?;
        if let Err(e) = fs::rename(&tmp, &self.path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        debug!(
            path = %self.path.display(),
            entries = file.videos.len(),
            "History saved"
        );
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for JsonFileStore {
    async fn load(&self) -> HistoryResult<Vec<HistoryEntry>> {
        Ok(self.read_file().await?.videos)
    }

    async fn append(&self, entry: HistoryEntry) -> HistoryResult<()> {
        let mut file = self.read_file().await?;
        file.push_front(entry);
        self.write_file(&file).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use sora_models::MAX_HISTORY_ENTRIES;
    use tempfile::TempDir;

    fn entry(id: &str) -> HistoryEntry {
        let at = Utc.with_ymd_and_hms(2025, 10, 7, 9, 0, 0).unwrap();
        HistoryEntry::with_timestamp(id, "a lighthouse at dusk", "sora-2", at)
            .output_file(format!("{}.mp4", id))
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("history.json"));
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_creates_directories_and_prepends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("history.json");
        let store = JsonFileStore::new(&path);

        store.append(entry("video_1")).await.unwrap();
        store.append(entry("video_2")).await.unwrap();

        let entries = store.load().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "video_2");
        assert_eq!(entries[1].id, "video_1");
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_document_shape_is_human_readable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        let store = JsonFileStore::new(&path);
        store.append(entry("video_1")).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\n  \"videos\": ["));
        let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(doc["videos"][0]["id"], "video_1");
        assert_eq!(doc["videos"][0]["created_at"], "2025-10-07T09:00:00Z");
        assert_eq!(doc["videos"][0]["output_file"], "video_1.mp4");
    }

    #[tokio::test]
    async fn test_101st_append_evicts_oldest() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("history.json"));
        for i in 0..MAX_HISTORY_ENTRIES {
            store.append(entry(&format!("video_{}", i))).await.unwrap();
        }
        store.append(entry("video_new")).await.unwrap();

        let entries = store.load().await.unwrap();
        assert_eq!(entries.len(), MAX_HISTORY_ENTRIES);
        assert_eq!(entries[0].id, "video_new");
        assert_eq!(entries.last().unwrap().id, "video_1");
    }

    #[tokio::test]
    async fn test_corrupt_file_names_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, b"{not json").unwrap();

        let err = JsonFileStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, HistoryError::Corrupt { .. }));
        assert!(err.to_string().contains("history.json"));
    }

    #[tokio::test]
    async fn test_resolve_by_filename_from_disk() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("history.json"));
        store.append(entry("video_1")).await.unwrap();
        store.append(entry("video_2")).await.unwrap();

        assert_eq!(store.resolve("video_1.mp4").await.unwrap(), "video_1");
        assert_eq!(store.resolve("@last").await.unwrap(), "video_2");
    }
}
