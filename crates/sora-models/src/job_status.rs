//! Job status vocabulary.
//!
//! The remote service reports status as free-form strings. They are folded
//! into a closed set here, with `Unknown` keeping the poller running instead of
//! looping silently on a string nobody recognized.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status strings treated as success (case-insensitive).
pub const SUCCESS_STATUSES: &[&str] = &["succeeded", "completed", "complete", "done", "ready"];

/// Status strings treated as failure (case-insensitive).
pub const FAILURE_STATUSES: &[&str] = &["failed", "error"];

/// Classified job status.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobPhase {
    /// Waiting for capacity on the remote side
    Queued,
    /// Actively generating
    InProgress,
    /// Finished; content can be downloaded
    Succeeded,
    /// Finished without content
    Failed,
    /// Anything else; keep polling
    Unknown(String),
}

impl JobPhase {
    /// Classify a raw status string.
    pub fn parse(raw: &str) -> Self {
        let lower = raw.trim().to_lowercase();
        if SUCCESS_STATUSES.contains(&lower.as_str()) {
            return JobPhase::Succeeded;
        }
        if FAILURE_STATUSES.contains(&lower.as_str()) {
            return JobPhase::Failed;
        }
        match lower.as_str() {
            "queued" | "pending" => JobPhase::Queued,
            "in_progress" | "running" | "processing" => JobPhase::InProgress,
            _ => JobPhase::Unknown(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            JobPhase::Queued => "queued",
            JobPhase::InProgress => "in_progress",
            JobPhase::Succeeded => "succeeded",
            JobPhase::Failed => "failed",
            JobPhase::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for JobPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
