//! History store capability.

use async_trait::async_trait;

use sora_models::HistoryEntry;

use crate::error::HistoryResult;
use crate::resolve::resolve_reference;

/// A bounded, most-recent-first log of past generations.
///
/// Callers never touch the backing file directly; everything goes through
/// this trait so tests can swap in [`MemoryHistoryStore`](crate::MemoryHistoryStore).
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// All entries, most recent first. A store that was never written is empty.
    async fn load(&self) -> HistoryResult<Vec<HistoryEntry>>;

    /// Prepend `entry`, evict past the cap, and persist.
    async fn append(&self, entry: HistoryEntry) -> HistoryResult<()>;

    /// Turn a remix reference into a job id.
    async fn resolve(&self, reference: &str) -> HistoryResult<String> {
        let entries = self.load().await?;
        resolve_reference(&entries, reference)
    }
}
