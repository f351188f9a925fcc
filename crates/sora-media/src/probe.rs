//! Video geometry from ISO-BMFF metadata.
//!
//! Reads `moov/trak/tkhd` boxes directly, so no frames are decoded and no
//! external tool is needed to learn a clip's dimensions. Works for MP4 and
//! QuickTime files; other containers surface as probe errors.

use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use sora_models::Dimensions;

use crate::error::{MediaError, MediaResult};

/// Box nesting deeper than this is treated as corrupt.
const MAX_DEPTH: usize = 8;

#[derive(Debug, Clone, Copy)]
struct BoxHeader {
    kind: [u8; 4],
    /// Offset of the payload
    start: u64,
    /// Offset one past the end of the box
    end: u64,
}

/// Probe an MP4/QuickTime file on disk for its first video track's dimensions.
pub fn probe_mp4_dimensions(path: &Path) -> MediaResult<Dimensions> {
    let mut file = std::fs::File::open(path).map_err(|e| MediaError::io(path, e))?;
    read_track_dimensions(&mut file).map_err(|e| match e {
        MediaError::DimensionProbe { message, .. } => MediaError::probe(path, message),
        MediaError::Io { source, .. } => MediaError::io(path, source),
        other => other,
    })
}

/// Find the first `tkhd` with non-zero width and height.
///
/// Top-level boxes are walked one at a time and the walk stops at the first
/// `moov`, so damage after it (such as a truncated `mdat`) does not matter.
pub fn read_track_dimensions<R: Read + Seek>(reader: &mut R) -> MediaResult<Dimensions> {
    let len = reader.seek(SeekFrom::End(0)).map_err(stream_io)?;
    if len == 0 {
        return Err(probe_err("file is empty"));
    }

    let mut pos = 0;
    while let Some(header) = next_box(reader, pos, len)? {
        if &header.kind == b"moov" {
            return search_moov(reader, header, 1)?
                .ok_or_else(|| probe_err("video dimensions not found in track headers"));
        }
        pos = header.end;
    }
    Err(probe_err("no moov box found"))
}

fn search_moov<R: Read + Seek>(
    reader: &mut R,
    parent: BoxHeader,
    depth: usize,
) -> MediaResult<Option<Dimensions>> {
    if depth > MAX_DEPTH {
        return Err(probe_err("box nesting too deep"));
    }
    for child in child_boxes(reader, parent.start, parent.end)? {
        match &child.kind {
            b"trak" => {
                if let Some(dims) = search_moov(reader, child, depth + 1)? {
                    return Ok(Some(dims));
                }
            }
            b"tkhd" => {
                if let Some(dims) = parse_tkhd(reader, child)? {
                    return Ok(Some(dims));
                }
            }
            _ => {}
        }
    }
    Ok(None)
}

/// Width/height are 16.16 fixed point at the end of the header.
fn parse_tkhd<R: Read + Seek>(reader: &mut R, header: BoxHeader) -> MediaResult<Option<Dimensions>> {
    seek(reader, header.start)?;
    let mut version = [0u8; 4];
    read_exact(reader, &mut version)?;

    // creation/modification times, track id, reserved, duration
    let skip: u64 = if version[0] == 1 { 8 + 8 + 4 + 4 + 8 } else { 4 + 4 + 4 + 4 + 4 };
    // reserved(8) layer(2) alternate_group(2) volume(2) reserved(2) matrix(36)
    let offset = header.start + 4 + skip + 8 + 2 + 2 + 2 + 2 + 36;
    if offset + 8 > header.end {
        return Err(probe_err("truncated tkhd box"));
    }

    seek(reader, offset)?;
    let mut dims = [0u8; 8];
    read_exact(reader, &mut dims)?;
    let width = u32::from_be_bytes([dims[0], dims[1], dims[2], dims[3]]) >> 16;
    let height = u32::from_be_bytes([dims[4], dims[5], dims[6], dims[7]]) >> 16;

    if width > 0 && height > 0 {
        Ok(Some(Dimensions::new(width, height)))
    } else {
        // audio tracks carry zero geometry
        Ok(None)
    }
}

/// Read the headers of all boxes in `[start, end)`.
fn child_boxes<R: Read + Seek>(reader: &mut R, start: u64, end: u64) -> MediaResult<Vec<BoxHeader>> {
    let mut boxes = Vec::new();
    let mut pos = start;
    while let Some(header) = next_box(reader, pos, end)? {
        pos = header.end;
        boxes.push(header);
    }
    Ok(boxes)
}

/// Header of the box at `pos`, or `None` once fewer than 8 bytes remain.
fn next_box<R: Read + Seek>(reader: &mut R, pos: u64, end: u64) -> MediaResult<Option<BoxHeader>> {
    if pos + 8 > end {
        return Ok(None);
    }
    seek(reader, pos)?;
    let mut head = [0u8; 8];
    read_exact(reader, &mut head)?;

    let size32 = u32::from_be_bytes([head[0], head[1], head[2], head[3]]) as u64;
    let kind = [head[4], head[5], head[6], head[7]];

    let (payload_start, size) = match size32 {
        // box extends to the end of its parent
        0 => (pos + 8, end - pos),
        1 => {
            let mut large = [0u8; 8];
            read_exact(reader, &mut large)?;
            (pos + 16, u64::from_be_bytes(large))
        }
        n => (pos + 8, n),
    };

    let box_end = pos
        .checked_add(size)
        .ok_or_else(|| probe_err("box size overflow"))?;
    if size < payload_start - pos || box_end > end {
        return Err(probe_err(format!(
            "invalid size for '{}' box",
            String::from_utf8_lossy(&kind)
        )));
    }

    Ok(Some(BoxHeader {
        kind,
        start: payload_start,
        end: box_end,
    }))
}

fn seek<R: Seek>(reader: &mut R, pos: u64) -> MediaResult<()> {
    reader.seek(SeekFrom::Start(pos)).map_err(stream_io)?;
    Ok(())
}

fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8]) -> MediaResult<()> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            probe_err("unexpected end of file")
        } else {
            stream_io(e)
        }
    })
}

// Callers holding a path replace the placeholder.
const STREAM: &str = "<stream>";

fn probe_err(message: impl Into<String>) -> MediaError {
    MediaError::probe(STREAM, message)
}

fn stream_io(e: std::io::Error) -> MediaError {
    MediaError::io(STREAM, e)
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_reads_video_track_skipping_audio() {
        let data = minimal_mp4(Dimensions::new(1920, 1080));
        let dims = read_track_dimensions(&mut Cursor::new(data)).unwrap();
        assert_eq!(dims, Dimensions::new(1920, 1080));
    }

    #[test]
    fn test_reads_version_1_header() {
        let trak = mp4_box(b"trak", &tkhd_v1(720, 1280));
        let data = mp4_box(b"moov", &trak);
        let dims = read_track_dimensions(&mut Cursor::new(data)).unwrap();
        assert_eq!(dims, Dimensions::new(720, 1280));
    }

    #[test]
    fn test_empty_file_is_probe_error() {
        let err = read_track_dimensions(&mut Cursor::new(Vec::new())).unwrap_err();
        assert!(matches!(err, MediaError::DimensionProbe { .. }));
    }

    #[test]
    fn test_missing_moov_is_probe_error() {
        let data = mp4_box(b"ftyp", b"isom");
        let err = read_track_dimensions(&mut Cursor::new(data)).unwrap_err();
        assert!(err.to_string().contains("no moov box"));
    }

    #[test]
    fn test_audio_only_is_probe_error() {
        let data = mp4_box(b"moov", &mp4_box(b"trak", &tkhd_v0(0, 0)));
        let err = read_track_dimensions(&mut Cursor::new(data)).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_truncated_box_is_probe_error() {
        let mut data = minimal_mp4(Dimensions::new(640, 480));
        data.truncate(60);
        let err = read_track_dimensions(&mut Cursor::new(data)).unwrap_err();
        assert!(matches!(err, MediaError::DimensionProbe { .. }));
    }

    #[test]
    fn test_truncated_box_after_moov_is_ignored() {
        let mut data = minimal_mp4(Dimensions::new(1280, 720));
        // mdat header claiming far more payload than the file holds
        data.extend_from_slice(&4096u32.to_be_bytes());
        data.extend_from_slice(b"mdat");
        data.extend_from_slice(&[0u8; 16]);
        let dims = read_track_dimensions(&mut Cursor::new(data)).unwrap();
        assert_eq!(dims, Dimensions::new(1280, 720));
    }

    #[test]
    fn test_truncated_box_before_moov_is_probe_error() {
        let mut data = mp4_box(b"ftyp", b"isom");
        data.extend_from_slice(&4096u32.to_be_bytes());
        data.extend_from_slice(b"mdat");
        data.extend(minimal_mp4(Dimensions::new(1280, 720)));
        let err = read_track_dimensions(&mut Cursor::new(data)).unwrap_err();
        assert!(err.to_string().contains("invalid size for 'mdat' box"), "{}", err);
    }

    #[test]
    fn test_probe_error_names_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("garbage.mp4");
        std::fs::write(&path, b"not an mp4 at all").unwrap();
        let err = probe_mp4_dimensions(&path).unwrap_err();
        assert!(err.to_string().contains("garbage.mp4"), "{}", err);
    }
}
