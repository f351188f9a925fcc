//! Remote job API capability.

use async_trait::async_trait;

use sora_models::{JobId, JobSnapshot};

use crate::error::ClientResult;
use crate::types::{CreateVideoRequest, Download};

/// The four remote operations a generation run needs.
///
/// Each call is a single request with no internal retry. Dropping the
/// returned future aborts the request in flight.
#[async_trait]
pub trait VideoApi: Send + Sync {
    /// Submit a new generation.
    async fn create(&self, request: CreateVideoRequest) -> ClientResult<JobId>;

    /// Submit a remix of `source`. Model, size and duration come from the source job.
    async fn remix(&self, source: &JobId, prompt: &str) -> ClientResult<JobId>;

    /// Fetch the current job state. A job-level error is returned as data.
    async fn status(&self, id: &JobId) -> ClientResult<JobSnapshot>;

    /// Where the finished video for `id` can be fetched.
    fn content_url(&self, id: &JobId) -> String;

    /// Start streaming `url`.
    async fn download(&self, url: &str) -> ClientResult<Download>;
}
