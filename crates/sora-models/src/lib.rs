//! Shared data models for the Sora video generation CLI.
//!
//! This crate provides Serde-serializable types for:
//! - Remote video jobs and their status vocabulary
//! - Generation parameters (model, size, duration)
//! - Persisted history entries
//! - Conformed media assets ready for upload

pub mod history;
pub mod job;
pub mod job_status;
pub mod media;
pub mod params;

// Re-export common types
pub use history::{HistoryEntry, HistoryFile, MAX_HISTORY_ENTRIES};
pub use job::{ApiErrorBody, JobId, JobSnapshot};
pub use job_status::JobPhase;
pub use media::{Dimensions, MediaAsset, MediaKind};
pub use params::{Model, ParamError, Seconds, VideoSize};
