//! Video transcoding capability.
//!
//! Resizing video needs an external tool. The conformer only talks to the
//! `Transcoder` trait so its branching can be exercised without FFmpeg
//! installed, and a missing tool is detected before anything is spawned.

use std::path::Path;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::info;

use sora_models::Dimensions;

use crate::command::{check_ffmpeg, FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Installation guidance shown when a resize needs FFmpeg and it is missing.
pub const FFMPEG_INSTALL_HINT: &str = "ffmpeg is required but was not found in PATH.
Please install ffmpeg:
  Ubuntu/Debian: sudo apt-get install ffmpeg
  macOS: brew install ffmpeg
  Or download from: https://ffmpeg.org/download.html";

/// Fixed encode policy for resized uploads.
pub const RESIZE_CODEC: &str = "libx264";
pub const RESIZE_CRF: u8 = 23;
pub const RESIZE_PRESET: &str = "fast";

/// Something that can rescale a video file to an exact geometry.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Whether the capability can be used right now.
    fn is_available(&self) -> bool;

    /// Scale `input` to `target`, writing an audio-less clip to `output`.
    async fn scale(&self, input: &Path, output: &Path, target: Dimensions) -> MediaResult<()>;
}

/// FFmpeg CLI transcoder.
#[derive(Default)]
pub struct FfmpegTranscoder {
    cancel_rx: Option<watch::Receiver<bool>>,
    timeout_secs: Option<u64>,
}

impl FfmpegTranscoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Abort the running FFmpeg process when the flag flips to `true`.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// The command used for a resize.
    pub fn resize_command(input: &Path, output: &Path, target: Dimensions) -> FfmpegCommand {
        FfmpegCommand::new(input, output)
            .scale(target.width, target.height)
            .video_codec(RESIZE_CODEC)
            .crf(RESIZE_CRF)
            .preset(RESIZE_PRESET)
            .no_audio()
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    fn is_available(&self) -> bool {
        check_ffmpeg().is_ok()
    }

    async fn scale(&self, input: &Path, output: &Path, target: Dimensions) -> MediaResult<()> {
        let mut runner = FfmpegRunner::new();
        if let Some(rx) = &self.cancel_rx {
            runner = runner.with_cancel(rx.clone());
        }
        if let Some(secs) = self.timeout_secs {
            runner = runner.with_timeout(secs);
        }

        runner
            .run(&Self::resize_command(input, output, target))
            .await?;
        info!(output = %output.display(), target = %target, "Video resized");
        Ok(())
    }
}

/// Transcoder for environments with no transcoding tool.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableTranscoder;

#[async_trait]
impl Transcoder for UnavailableTranscoder {
    fn is_available(&self) -> bool {
        false
    }

    async fn scale(&self, _input: &Path, _output: &Path, _target: Dimensions) -> MediaResult<()> {
        Err(MediaError::FfmpegNotFound)
    }
}
