use std::{fs, path::Path};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use crate::{errors::Error, files::format_size, Result};

pub const THUMBNAIL_MAX_SIZE: u64 = 200 * 1024;
pub const THUMBNAIL_MAX_WIDTH: u16 = 320;
pub const THUMBNAIL_MAX_HEIGHT: u16 = 320;

/// Validate a thumbnail file (JPEG, bounded size and dimensions) and encode
/// it to base64 for storage in the config collaborator.
pub fn encode_file(path: &Path) -> Result<String> {
    let data = fs::read(path).map_err(|e| {
        Error::Thumbnail(format!("cannot read {}: {e}", path.display()))
    })?;

    if data.len() as u64 > THUMBNAIL_MAX_SIZE {
        return Err(Error::Thumbnail(format!(
            "too large: {} (max {})",
            format_size(data.len() as u64),
            format_size(THUMBNAIL_MAX_SIZE)
        )));
    }

    let Some((width, height)) = jpeg_dimensions(&data) else {
        return Err(Error::Thumbnail(format!(
            "not a JPEG image: {}",
            path.display()
        )));
    };

    if width > THUMBNAIL_MAX_WIDTH || height > THUMBNAIL_MAX_HEIGHT {
        return Err(Error::Thumbnail(format!(
            "dimensions {width}x{height} exceed {THUMBNAIL_MAX_WIDTH}x{THUMBNAIL_MAX_HEIGHT}"
        )));
    }

    Ok(BASE64.encode(&data))
}

/// Decode a stored thumbnail back into raw bytes.
pub fn decode(encoded: &str) -> Result<Vec<u8>> {
    BASE64
        .decode(encoded)
        .map_err(|e| Error::Thumbnail(format!("invalid base64: {e}")))
}

/// Read (width, height) from the first SOF segment of a JPEG stream. No
/// decoder needed: only the marker structure is walked.
fn jpeg_dimensions(data: &[u8]) -> Option<(u16, u16)> {
    if data.len() < 4 || data[0] != 0xFF || data[1] != 0xD8 {
        return None;
    }

    let mut i = 2usize;
    while i + 3 < data.len() {
        if data[i] != 0xFF {
            return None;
        }
        let marker = data[i + 1];

        // Fill byte before a marker.
        if marker == 0xFF {
            i += 1;
            continue;
        }
        // Standalone markers carry no length field.
        if marker == 0x01 || (0xD0..=0xD8).contains(&marker) {
            i += 2;
            continue;
        }

        let len = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
        let is_sof = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_sof {
            if i + 8 >= data.len() {
                return None;
            }
            let height = u16::from_be_bytes([data[i + 5], data[i + 6]]);
            let width = u16::from_be_bytes([data[i + 7], data[i + 8]]);
            return Some((width, height));
        }

        i += 2 + len;
    }

    None
}
