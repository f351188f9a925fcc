//! Remote video job models.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::job_status::JobPhase;

/// Opaque job identifier assigned by the remote service.
///
/// Once obtained it is the only key used for status and content calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Default output filename for this job's video.
    pub fn default_filename(&self) -> String {
        format!("{}.mp4", self.0)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Structured error object embedded in API envelopes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl ApiErrorBody {
    /// An error object only counts when it carries a message.
    pub fn is_set(&self) -> bool {
        !self.message.trim().is_empty()
    }
}

/// Snapshot of a job as returned by submit and status calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSnapshot {
    /// Job id (may be empty in malformed envelopes)
    #[serde(default)]
    pub id: String,
    /// Raw status string from the remote service
    #[serde(default)]
    pub status: String,
    /// Progress percentage (0-100), sparse
    #[serde(
        default,
        deserialize_with = "deserialize_progress",
        skip_serializing_if = "Option::is_none"
    )]
    pub progress: Option<u8>,
    /// Job-level error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiErrorBody>,
    /// Model the job runs on, when the service reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl JobSnapshot {
    /// Create a snapshot with the given status and no progress or error.
    pub fn new(id: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: status.into(),
            progress: None,
            error: None,
            model: None,
        }
    }

    /// Set the progress value.
    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Set a job-level error message.
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(ApiErrorBody {
            message: message.into(),
            kind: None,
        });
        self
    }

    /// Classified status.
    pub fn phase(&self) -> JobPhase {
        JobPhase::parse(&self.status)
    }

    /// Job-level error message, if one is present and non-empty.
    pub fn error_message(&self) -> Option<&str> {
        self.error
            .as_ref()
            .filter(|e| e.is_set())
            .map(|e| e.message.as_str())
    }

    /// Progress clamped to 0-100.
    pub fn progress_percent(&self) -> Option<u8> {
        self.progress.map(|p| p.min(100))
    }
}

/// Accepts any JSON number and clamps it into 0-100.
fn deserialize_progress<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value
        .filter(|v| v.is_finite())
        .map(|v| v.clamp(0.0, 100.0).round() as u8))
}
