//! Input classification by file extension.

use std::path::Path;

use sora_models::MediaKind;

/// Known input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaFormat {
    Jpeg,
    Png,
    Webp,
    /// Decodable, but re-encoded as JPEG before upload
    Bmp,
    Gif,
    Tiff,
    Mp4,
    QuickTime,
    Webm,
    Avi,
}

impl MediaFormat {
    /// Classify a path by extension (case-insensitive). `None` means unsupported.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        let format = match ext.as_str() {
            "jpg" | "jpeg" => MediaFormat::Jpeg,
            "png" => MediaFormat::Png,
            "webp" => MediaFormat::Webp,
            "bmp" => MediaFormat::Bmp,
            "gif" => MediaFormat::Gif,
            "tif" | "tiff" => MediaFormat::Tiff,
            "mp4" | "m4v" => MediaFormat::Mp4,
            "mov" => MediaFormat::QuickTime,
            "webm" => MediaFormat::Webm,
            "avi" => MediaFormat::Avi,
            _ => return None,
        };
        Some(format)
    }

    pub fn kind(&self) -> MediaKind {
        match self {
            MediaFormat::Jpeg
            | MediaFormat::Png
            | MediaFormat::Webp
            | MediaFormat::Bmp
            | MediaFormat::Gif
            | MediaFormat::Tiff => MediaKind::Image,
            MediaFormat::Mp4 | MediaFormat::QuickTime | MediaFormat::Webm | MediaFormat::Avi => {
                MediaKind::Video
            }
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            MediaFormat::Jpeg => "image/jpeg",
            MediaFormat::Png => "image/png",
            MediaFormat::Webp => "image/webp",
            MediaFormat::Bmp => "image/bmp",
            MediaFormat::Gif => "image/gif",
            MediaFormat::Tiff => "image/tiff",
            MediaFormat::Mp4 => "video/mp4",
            MediaFormat::QuickTime => "video/quicktime",
            MediaFormat::Webm => "video/webm",
            MediaFormat::Avi => "video/x-msvideo",
        }
    }

    /// Whether the upload endpoint accepts this image format as-is.
    pub fn is_upload_image(&self) -> bool {
        matches!(self, MediaFormat::Jpeg | MediaFormat::Png | MediaFormat::Webp)
    }

    /// Format used when re-encoding an image of this format.
    pub fn encode_target(&self) -> MediaFormat {
        match self {
            MediaFormat::Png => MediaFormat::Png,
            MediaFormat::Webp => MediaFormat::Webp,
            _ => MediaFormat::Jpeg,
        }
    }

    /// Canonical extension written after re-encoding.
    pub fn canonical_extension(&self) -> &'static str {
        match self {
            MediaFormat::Jpeg => "jpg",
            MediaFormat::Png => "png",
            MediaFormat::Webp => "webp",
            MediaFormat::Bmp => "bmp",
            MediaFormat::Gif => "gif",
            MediaFormat::Tiff => "tiff",
            MediaFormat::Mp4 => "mp4",
            MediaFormat::QuickTime => "mov",
            MediaFormat::Webm => "webm",
            MediaFormat::Avi => "avi",
        }
    }
}

/// Base filename of `path`, with its extension replaced when `format` differs.
pub fn upload_filename(path: &Path, format: Option<MediaFormat>) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "input".to_string());
    let Some(format) = format else {
        return name;
    };
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "input".to_string());
    let ext = format.canonical_extension();
    let current = path
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_default();
    if current == ext {
        name
    } else {
        format!("{}.{}", stem, ext)
    }
}
