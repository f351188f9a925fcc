//! Request and response types.

use std::fmt;

use bytes::Bytes;
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};

use sora_models::{ApiErrorBody, MediaAsset, Model, Seconds, VideoSize};

use crate::error::ClientResult;

/// Parameters for a new generation.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateVideoRequest {
    pub model: Model,
    pub prompt: String,
    pub size: VideoSize,
    pub seconds: Seconds,
    /// Conformed media sent as `input_reference`
    pub input_reference: Option<MediaAsset>,
}

impl CreateVideoRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            model: Model::default(),
            prompt: prompt.into(),
            size: VideoSize::default(),
            seconds: Seconds::default(),
            input_reference: None,
        }
    }

    pub fn model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    pub fn size(mut self, size: VideoSize) -> Self {
        self.size = size;
        self
    }

    pub fn seconds(mut self, seconds: Seconds) -> Self {
        self.seconds = seconds;
        self
    }

    pub fn input_reference(mut self, asset: Option<MediaAsset>) -> Self {
        self.input_reference = asset;
        self
    }
}

/// A streaming content response.
pub struct Download {
    /// `Content-Length`, when the server sent one
    pub content_length: Option<u64>,
    pub stream: BoxStream<'static, ClientResult<Bytes>>,
}

impl fmt::Debug for Download {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Download")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// JSON body for `POST /videos` without media.
#[derive(Debug, Serialize)]
pub(crate) struct CreateBody<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub size: &'a str,
    pub seconds: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct RemixBody<'a> {
    pub prompt: &'a str,
}

/// Envelope returned by both submit calls.
#[derive(Debug, Deserialize)]
pub(crate) struct SubmitEnvelope {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub error: Option<ApiErrorBody>,
}
