//! Media conforming for uploads.
//!
//! This crate provides:
//! - Extension-based classification of input files
//! - In-process image fill transform (scale + center crop) and re-encoding
//! - MP4/QuickTime track-header probing without decoding frames
//! - A `Transcoder` capability with an FFmpeg CLI implementation
//! - `MediaConformer`, which ties the above together

pub mod command;
pub mod conform;
pub mod error;
pub mod format;
pub mod image_ops;
pub mod probe;
pub mod progress;
pub mod transcoder;

pub use command::{check_ffmpeg, FfmpegCommand, FfmpegRunner};
pub use conform::{MediaConformer, Notice};
pub use error::{MediaError, MediaResult};
pub use format::MediaFormat;
pub use probe::{probe_mp4_dimensions, read_track_dimensions};
pub use progress::FfmpegProgress;
pub use transcoder::{FfmpegTranscoder, Transcoder, UnavailableTranscoder, FFMPEG_INSTALL_HINT};
