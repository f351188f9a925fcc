//! In-process image conforming.
//!
//! Images are decoded into memory, fill-resized (uniform scale so the shorter
//! side covers the target, then a centered crop) and re-encoded. There is no
//! letterbox mode: output geometry always equals the target exactly.

use std::io::Cursor;
use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageOutputFormat};
use tracing::debug;

use sora_models::Dimensions;

use crate::error::{MediaError, MediaResult};
use crate::format::MediaFormat;

/// Lossy WebP quality used for re-encoding.
pub const WEBP_QUALITY: f32 = 90.0;

/// JPEG quality matching the encoder's own default.
pub const JPEG_QUALITY: u8 = 75;

/// Decode image bytes, guessing the codec from content.
///
/// Also returns the codec the bytes were sniffed as, which can disagree with
/// the file extension.
pub fn decode_image(path: &Path, bytes: &[u8]) -> MediaResult<(DynamicImage, Option<MediaFormat>)> {
    if bytes.is_empty() {
        return Err(MediaError::decode(path, "file is empty"));
    }
    let reader = image::io::Reader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| MediaError::decode(path, e))?;
    let detected = reader.format().and_then(media_format);
    let img = reader.decode().map_err(|e| MediaError::decode(path, e))?;

    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(MediaError::decode(path, "image has zero dimensions"));
    }
    Ok((img, detected))
}

fn media_format(format: ImageFormat) -> Option<MediaFormat> {
    match format {
        ImageFormat::Jpeg => Some(MediaFormat::Jpeg),
        ImageFormat::Png => Some(MediaFormat::Png),
        ImageFormat::WebP => Some(MediaFormat::Webp),
        ImageFormat::Bmp => Some(MediaFormat::Bmp),
        ImageFormat::Gif => Some(MediaFormat::Gif),
        ImageFormat::Tiff => Some(MediaFormat::Tiff),
        _ => None,
    }
}

/// Geometry of a decoded image.
pub fn image_dimensions(img: &DynamicImage) -> Dimensions {
    let (width, height) = img.dimensions();
    Dimensions::new(width, height)
}

/// Scale to cover `target`, then crop around the center.
pub fn fill(img: &DynamicImage, target: Dimensions) -> DynamicImage {
    debug!(
        from = %image_dimensions(img),
        to = %target,
        "Applying fill transform"
    );
    img.resize_to_fill(target.width, target.height, FilterType::Lanczos3)
}

/// Encode `img` as `format` (JPEG for anything outside JPEG/PNG/WebP).
///
/// Returns the bytes and the format actually written.
pub fn encode_image(img: &DynamicImage, format: MediaFormat) -> MediaResult<(Vec<u8>, MediaFormat)> {
    let target = format.encode_target();
    let mut buf = Vec::new();

    match target {
        MediaFormat::Png => {
            img.write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Png)
                .map_err(|e| MediaError::encode("png", e))?;
        }
        MediaFormat::Webp => {
            let rgba = img.to_rgba8();
            let encoded = webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height())
                .encode_simple(false, WEBP_QUALITY)
                .map_err(|e| MediaError::encode("webp", format!("{:?}", e)))?;
            buf.extend_from_slice(&encoded);
        }
        _ => {
            // JPEG carries no alpha channel
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            rgb.write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Jpeg(JPEG_QUALITY))
                .map_err(|e| MediaError::encode("jpeg", e))?;
        }
    }

    Ok((buf, target))
}
