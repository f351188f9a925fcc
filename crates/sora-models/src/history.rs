//! Persisted generation history.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of entries retained in the history file.
pub const MAX_HISTORY_ENTRIES: usize = 100;

/// One completed (or, when configured, failed) generation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Remote job id
    pub id: String,
    /// Prompt text
    pub prompt: String,
    /// RFC 3339 UTC timestamp
    pub created_at: String,
    /// Output path; empty when nothing was saved
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub output_file: String,
    /// Model variant name
    pub model: String,
    /// Input media path, if one was supplied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_input: Option<String>,
    /// Source job id when this was a remix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remixed_from: Option<String>,
    /// Job-level failure message (only for recorded failures)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HistoryEntry {
    /// Create an entry stamped with the current time.
    pub fn new(id: impl Into<String>, prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_timestamp(id, prompt, model, Utc::now())
    }

    /// Create an entry with an explicit timestamp.
    pub fn with_timestamp(
        id: impl Into<String>,
        prompt: impl Into<String>,
        model: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
            created_at: at.to_rfc3339_opts(SecondsFormat::Secs, true),
            output_file: String::new(),
            model: model.into(),
            image_input: None,
            remixed_from: None,
            error: None,
        }
    }

    pub fn output_file(mut self, path: impl Into<String>) -> Self {
        self.output_file = path.into();
        self
    }

    pub fn image_input(mut self, path: Option<String>) -> Self {
        self.image_input = path.filter(|p| !p.is_empty());
        self
    }

    pub fn remixed_from(mut self, source: Option<String>) -> Self {
        self.remixed_from = source.filter(|s| !s.is_empty());
        self
    }

    pub fn failed_with(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }
}

/// On-disk document: `{"videos": [...]}`, most recent first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryFile {
    #[serde(default)]
    pub videos: Vec<HistoryEntry>,
}

impl HistoryFile {
    /// Insert at the front and evict from the tail beyond the cap.
    pub fn push_front(&mut self, entry: HistoryEntry) {
        self.videos.insert(0, entry);
        self.videos.truncate(MAX_HISTORY_ENTRIES);
    }
}
