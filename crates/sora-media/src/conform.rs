//! Conform local media to the upload geometry.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use sora_models::{Dimensions, MediaAsset, MediaKind};

use crate::error::{MediaError, MediaResult};
use crate::format::{upload_filename, MediaFormat};
use crate::image_ops::{decode_image, encode_image, fill, image_dimensions};
use crate::probe::probe_mp4_dimensions;
use crate::transcoder::Transcoder;

/// Turns a user-supplied image or video into bytes the create endpoint accepts.
///
/// Images are resized in-process. Videos already at the target size pass
/// through untouched; otherwise the injected `Transcoder` rescales them into a
/// private temp file that is removed when the call returns.
#[derive(Clone)]
pub struct MediaConformer {
    transcoder: Arc<dyn Transcoder>,
    temp_dir: Option<PathBuf>,
    notice: Option<Notice>,
}

/// Receives user-facing progress messages.
pub type Notice = Arc<dyn Fn(String) + Send + Sync>;

impl MediaConformer {
    pub fn new(transcoder: Arc<dyn Transcoder>) -> Self {
        Self {
            transcoder,
            temp_dir: None,
            notice: None,
        }
    }

    /// Send user-facing messages (such as a pending resize) to `notice`.
    pub fn with_notice(mut self, notice: Notice) -> Self {
        self.notice = Some(notice);
        self
    }

    /// Write transcoder output under `dir` instead of the system temp dir.
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Conform `path` to `target`.
    pub async fn conform(&self, path: &Path, target: Dimensions) -> MediaResult<MediaAsset> {
        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Err(MediaError::FileNotFound(path.to_path_buf())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(MediaError::FileNotFound(path.to_path_buf()));
            }
            Err(e) => return Err(MediaError::io(path, e)),
        }

        let format = MediaFormat::from_path(path)
            .ok_or_else(|| MediaError::UnsupportedFormat(path.to_path_buf()))?;

        match format.kind() {
            MediaKind::Image => self.conform_image(path, format, target).await,
            MediaKind::Video => self.conform_video(path, format, target).await,
        }
    }

    async fn conform_image(
        &self,
        path: &Path,
        format: MediaFormat,
        target: Dimensions,
    ) -> MediaResult<MediaAsset> {
        let bytes = read_file(path).await?;
        let owned_path = path.to_path_buf();

        tokio::task::spawn_blocking(move || conform_image_bytes(&owned_path, bytes, format, target))
            .await
            .map_err(|e| MediaError::internal(format!("image task failed: {}", e)))?
    }

    async fn conform_video(
        &self,
        path: &Path,
        format: MediaFormat,
        target: Dimensions,
    ) -> MediaResult<MediaAsset> {
        let owned_path = path.to_path_buf();
        let actual = tokio::task::spawn_blocking(move || probe_mp4_dimensions(&owned_path))
            .await
            .map_err(|e| MediaError::internal(format!("probe task failed: {}", e)))??;

        if actual == target {
            debug!(path = %path.display(), dims = %actual, "Video already at target size");
            return Ok(MediaAsset {
                bytes: read_file(path).await?,
                filename: upload_filename(path, None),
                content_type: format.content_type().to_string(),
                dimensions: actual,
                kind: MediaKind::Video,
            });
        }

        if !self.transcoder.is_available() {
            return Err(MediaError::TranscodeUnavailable {
                path: path.to_path_buf(),
                actual,
                target,
            });
        }

        info!(
            path = %path.display(),
            from = %actual,
            to = %target,
            "Resizing video"
        );
        if let Some(notice) = &self.notice {
            notice(format!(
                "Resizing video from {} to {} using ffmpeg...",
                actual, target
            ));
        }

        let mut builder = tempfile::Builder::new();
        builder.prefix("sora-resized-").suffix(".mp4");
        let temp = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir).map_err(|e| MediaError::io(dir, e))?,
            None => builder
                .tempfile()
                .map_err(|e| MediaError::io(std::env::temp_dir(), e))?,
        };
        // removed on drop, whichever way this function exits
        let temp_path = temp.into_temp_path();

        self.transcoder.scale(path, &temp_path, target).await?;
        let bytes = read_file(&temp_path).await?;
        if bytes.is_empty() {
            return Err(MediaError::ffmpeg_failed(
                path,
                "transcoder produced no output",
                None,
                None,
            ));
        }

        Ok(MediaAsset {
            bytes,
            filename: upload_filename(path, Some(MediaFormat::Mp4)),
            content_type: MediaFormat::Mp4.content_type().to_string(),
            dimensions: target,
            kind: MediaKind::Video,
        })
    }
}

async fn read_file(path: &Path) -> MediaResult<Vec<u8>> {
    tokio::fs::read(path).await.map_err(|e| MediaError::io(path, e))
}

/// Decode, fill-resize if needed, and re-encode an image.
///
/// The codec sniffed from the bytes wins over the extension.
fn conform_image_bytes(
    path: &Path,
    bytes: Vec<u8>,
    extension_format: MediaFormat,
    target: Dimensions,
) -> MediaResult<MediaAsset> {
    let (img, detected) = decode_image(path, &bytes)?;
    let format = detected.unwrap_or(extension_format);
    let actual = image_dimensions(&img);

    if actual == target && format.is_upload_image() {
        debug!(
            path = %path.display(),
            dims = %actual,
            format = ?format,
            "Image already at target size"
        );
        let rename = (format != extension_format).then_some(format);
        return Ok(MediaAsset {
            bytes,
            filename: upload_filename(path, rename),
            content_type: format.content_type().to_string(),
            dimensions: actual,
            kind: MediaKind::Image,
        });
    }

    let img = if actual == target { img } else { fill(&img, target) };
    let (encoded, written) = encode_image(&img, format)?;

    Ok(MediaAsset {
        bytes: encoded,
        filename: upload_filename(path, Some(written)),
        content_type: written.content_type().to_string(),
        dimensions: target,
        kind: MediaKind::Image,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::fixtures::minimal_mp4;
    use crate::transcoder::UnavailableTranscoder;
    use async_trait::async_trait;
    use image::{DynamicImage, GenericImageView, ImageOutputFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use std::sync::Mutex;
    use tempfile::TempDir;

    const LANDSCAPE: Dimensions = Dimensions::new(1280, 720);

    /// Writes fixed bytes and remembers where it wrote them.
    #[derive(Default)]
    struct FakeTranscoder {
        fail: bool,
        outputs: Mutex<Vec<PathBuf>>,
    }

    #[async_trait]
    impl Transcoder for FakeTranscoder {
        fn is_available(&self) -> bool {
            true
        }

        async fn scale(&self, input: &Path, output: &Path, _target: Dimensions) -> MediaResult<()> {
            self.outputs.lock().unwrap().push(output.to_path_buf());
            tokio::fs::write(output, b"resized-video")
                .await
                .map_err(|e| MediaError::io(output, e))?;
            if self.fail {
                return Err(MediaError::ffmpeg_failed(input, "boom", None, Some(1)));
            }
            Ok(())
        }
    }

    fn write_image(dir: &TempDir, name: &str, w: u32, h: u32, format: ImageOutputFormat) -> PathBuf {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(w, h, |x, y| {
            Rgb([(x % 255) as u8, (y % 255) as u8, 7])
        }));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
        let path = dir.path().join(name);
        std::fs::write(&path, buf).unwrap();
        path
    }

    fn unavailable() -> MediaConformer {
        MediaConformer::new(Arc::new(UnavailableTranscoder))
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let err = unavailable()
            .conform(Path::new("/nonexistent/input.png"), LANDSCAPE)
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn test_unknown_extension_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello").unwrap();
        let err = unavailable().conform(&path, LANDSCAPE).await.unwrap_err();
        assert!(matches!(err, MediaError::UnsupportedFormat(_)));
    }

    #[tokio::test]
    async fn test_image_output_matches_target_for_any_aspect() {
        let dir = TempDir::new().unwrap();
        for (i, (w, h)) in [(1920, 1080), (600, 900), (200, 200)].iter().enumerate() {
            let path = write_image(&dir, &format!("img{}.png", i), *w, *h, ImageOutputFormat::Png);
            let asset = unavailable().conform(&path, LANDSCAPE).await.unwrap();
            let decoded = image::load_from_memory(&asset.bytes).unwrap();
            assert_eq!(decoded.dimensions(), (1280, 720));
            assert_eq!(asset.content_type, "image/png");
            assert_eq!(asset.kind, MediaKind::Image);
        }
    }

    #[tokio::test]
    async fn test_image_at_target_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        let path = write_image(&dir, "exact.jpg", 1280, 720, ImageOutputFormat::Jpeg(90));
        let asset = unavailable().conform(&path, LANDSCAPE).await.unwrap();
        assert_eq!(asset.bytes, std::fs::read(&path).unwrap());
        assert_eq!(asset.filename, "exact.jpg");
        assert_eq!(asset.content_type, "image/jpeg");
    }

    #[tokio::test]
    async fn test_jpeg_extension_normalizes_on_reencode() {
        let dir = TempDir::new().unwrap();
        let path = write_image(&dir, "photo.jpeg", 640, 480, ImageOutputFormat::Jpeg(90));
        let asset = unavailable().conform(&path, LANDSCAPE).await.unwrap();
        assert_eq!(asset.filename, "photo.jpg");
        assert_eq!(asset.content_type, "image/jpeg");
    }

    #[tokio::test]
    async fn test_bmp_is_normalized_to_jpeg_even_at_target() {
        let dir = TempDir::new().unwrap();
        let path = write_image(&dir, "frame.bmp", 1280, 720, ImageOutputFormat::Bmp);
        let asset = unavailable().conform(&path, LANDSCAPE).await.unwrap();
        assert_eq!(asset.filename, "frame.jpg");
        assert_eq!(asset.content_type, "image/jpeg");
        assert_eq!(&asset.bytes[..2], &[0xFF, 0xD8]);
    }

    #[tokio::test]
    async fn test_corrupt_image_is_decode_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"").unwrap();
        let err = unavailable().conform(&path, LANDSCAPE).await.unwrap_err();
        assert!(matches!(err, MediaError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_video_at_target_passes_through() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clip.mp4");
        let data = minimal_mp4(LANDSCAPE);
        std::fs::write(&path, &data).unwrap();

        let asset = unavailable().conform(&path, LANDSCAPE).await.unwrap();
        assert_eq!(asset.bytes, data);
        assert_eq!(asset.filename, "clip.mp4");
        assert_eq!(asset.content_type, "video/mp4");
        assert_eq!(asset.kind, MediaKind::Video);
    }

    #[tokio::test]
    async fn test_video_mismatch_without_transcoder_is_actionable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, minimal_mp4(Dimensions::new(1920, 1080))).unwrap();

        let err = unavailable().conform(&path, LANDSCAPE).await.unwrap_err();
        match &err {
            MediaError::TranscodeUnavailable { actual, target, .. } => {
                assert_eq!(*actual, Dimensions::new(1920, 1080));
                assert_eq!(*target, LANDSCAPE);
            }
            other => panic!("expected TranscodeUnavailable, got {:?}", other),
        }
        assert!(err.to_string().contains("brew install ffmpeg"));
    }

    #[tokio::test]
    async fn test_unavailable_transcode_names_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("holiday_clip.mp4");
        std::fs::write(&path, minimal_mp4(Dimensions::new(1920, 1080))).unwrap();

        let err = unavailable().conform(&path, LANDSCAPE).await.unwrap_err();
        assert!(err.to_string().contains("holiday_clip.mp4"), "{}", err);
    }

    #[tokio::test]
    async fn test_failed_transcode_names_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("holiday_clip.mov");
        std::fs::write(&path, minimal_mp4(Dimensions::new(640, 480))).unwrap();

        let transcoder = Arc::new(FakeTranscoder {
            fail: true,
            ..Default::default()
        });
        let err = MediaConformer::new(transcoder)
            .conform(&path, LANDSCAPE)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("holiday_clip.mov"), "{}", err);
    }

    #[tokio::test]
    async fn test_resize_notice_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, minimal_mp4(Dimensions::new(1920, 1080))).unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let conformer = MediaConformer::new(Arc::new(FakeTranscoder::default()))
            .with_temp_dir(dir.path())
            .with_notice(Arc::new(move |msg: String| sink.lock().unwrap().push(msg)));
        conformer.conform(&path, LANDSCAPE).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec!["Resizing video from 1920x1080 to 1280x720 using ffmpeg...".to_string()]
        );
    }

    #[tokio::test]
    async fn test_image_codec_is_taken_from_content() {
        let dir = TempDir::new().unwrap();
        let path = write_image(&dir, "mislabeled.jpg", 1280, 720, ImageOutputFormat::Png);
        let asset = unavailable().conform(&path, LANDSCAPE).await.unwrap();
        assert_eq!(asset.content_type, "image/png");
        assert_eq!(asset.filename, "mislabeled.png");
        assert_eq!(asset.bytes, std::fs::read(&path).unwrap());
    }

    #[tokio::test]
    async fn test_mislabeled_image_is_reencoded_as_its_real_codec() {
        let dir = TempDir::new().unwrap();
        let path = write_image(&dir, "poster.jpg", 640, 360, ImageOutputFormat::Png);
        let asset = unavailable().conform(&path, LANDSCAPE).await.unwrap();
        assert_eq!(asset.content_type, "image/png");
        assert_eq!(asset.filename, "poster.png");
        assert_eq!(&asset.bytes[1..4], b"PNG");
    }

    #[tokio::test]
    async fn test_video_mismatch_uses_transcoder_and_cleans_up() {
        let dir = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();
        let path = dir.path().join("clip.mov");
        std::fs::write(&path, minimal_mp4(Dimensions::new(720, 1280))).unwrap();

        let transcoder = Arc::new(FakeTranscoder::default());
        let conformer = MediaConformer::new(transcoder.clone()).with_temp_dir(scratch.path());
        let asset = conformer.conform(&path, LANDSCAPE).await.unwrap();

        assert_eq!(asset.bytes, b"resized-video");
        assert_eq!(asset.filename, "clip.mp4");
        assert_eq!(asset.content_type, "video/mp4");
        let outputs = transcoder.outputs.lock().unwrap();
        assert_eq!(outputs.len(), 1);
        assert!(!outputs[0].exists(), "temp output must be removed");
    }

    #[tokio::test]
    async fn test_failed_transcode_still_removes_temp_file() {
        let dir = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, minimal_mp4(Dimensions::new(640, 480))).unwrap();

        let transcoder = Arc::new(FakeTranscoder {
            fail: true,
            ..Default::default()
        });
        let conformer = MediaConformer::new(transcoder.clone()).with_temp_dir(scratch.path());
        let err = conformer.conform(&path, LANDSCAPE).await.unwrap_err();

        assert!(matches!(err, MediaError::FfmpegFailed { .. }));
        assert!(!transcoder.outputs.lock().unwrap()[0].exists());
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_unparseable_video_is_probe_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.mp4");
        std::fs::write(&path, b"").unwrap();
        let err = unavailable().conform(&path, LANDSCAPE).await.unwrap_err();
        assert!(matches!(err, MediaError::DimensionProbe { .. }));
    }
}
