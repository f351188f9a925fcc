//! Errors from conforming input media.

use std::path::PathBuf;
use thiserror::Error;

use sora_models::Dimensions;

use crate::transcoder::FFMPEG_INSTALL_HINT;

/// Result alias for the media crate.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while conforming an input file.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("File does not exist: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Unsupported format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("Failed to decode {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },

    #[error("Failed to encode {format}: {message}")]
    Encode { format: String, message: String },

    #[error("Failed to read dimensions of {}: {message}", path.display())]
    DimensionProbe { path: PathBuf, message: String },

    #[error(
        "video {} is {actual} but needs to be {target}.\n{hint}",
        path.display(),
        hint = FFMPEG_INSTALL_HINT
    )]
    TranscodeUnavailable {
        path: PathBuf,
        actual: Dimensions,
        target: Dimensions,
    },

    #[error("FFmpeg failed on {}: {message}", path.display())]
    FfmpegFailed {
        path: PathBuf,
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create a decode failure for `path`.
    pub fn decode(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Decode {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create an encode failure.
    pub fn encode(format: impl Into<String>, message: impl ToString) -> Self {
        Self::Encode {
            format: format.into(),
            message: message.to_string(),
        }
    }

    /// Create a dimension probe failure for `path`.
    pub fn probe(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::DimensionProbe {
            path: path.into(),
            message: message.into(),
        }
    }

    /// IO failure while handling `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// FFmpeg ran on `path` and reported failure.
    pub fn ffmpeg_failed(
        path: impl Into<PathBuf>,
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            path: path.into(),
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Invariant broken inside this crate.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcode_unavailable_names_both_geometries() {
        let err = MediaError::TranscodeUnavailable {
            path: PathBuf::from("clips/intro.mp4"),
            actual: Dimensions::new(1920, 1080),
            target: Dimensions::new(1280, 720),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("video clips/intro.mp4 is 1920x1080 but needs to be 1280x720."));
        assert!(msg.contains("ffmpeg"));
    }

    #[test]
    fn test_decode_error_identifies_file() {
        let err = MediaError::decode("/tmp/broken.png", "unexpected EOF");
        assert_eq!(err.to_string(), "Failed to decode /tmp/broken.png: unexpected EOF");
    }

    #[test]
    fn test_io_and_ffmpeg_errors_identify_file() {
        let missing = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = MediaError::io("/tmp/locked.mov", missing);
        assert!(err.to_string().contains("/tmp/locked.mov"));

        let err = MediaError::ffmpeg_failed("/tmp/clip.webm", "exited with status 1", None, Some(1));
        assert_eq!(err.to_string(), "FFmpeg failed on /tmp/clip.webm: exited with status 1");
    }
}
