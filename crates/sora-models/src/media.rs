//! Media asset models.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Pixel geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Whether an asset is a still image or motion content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

/// Conformed input, ready for a single upload.
#[derive(Clone, PartialEq, Eq)]
pub struct MediaAsset {
    /// Encoded bytes
    pub bytes: Vec<u8>,
    /// Upload filename (extension matches `content_type`)
    pub filename: String,
    /// MIME type
    pub content_type: String,
    /// Geometry of `bytes`
    pub dimensions: Dimensions,
    pub kind: MediaKind,
}

impl fmt::Debug for MediaAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaAsset")
            .field("bytes", &self.bytes.len())
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("dimensions", &self.dimensions)
            .field("kind", &self.kind)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions_display() {
        assert_eq!(Dimensions::new(1280, 720).to_string(), "1280x720");
    }

    #[test]
    fn test_debug_hides_payload() {
        let asset = MediaAsset {
            bytes: vec![0; 2048],
            filename: "a.png".into(),
            content_type: "image/png".into(),
            dimensions: Dimensions::new(2, 2),
            kind: MediaKind::Image,
        };
        let dbg = format!("{:?}", asset);
        assert!(dbg.contains("bytes: 2048"));
    }
}
