//! PNG encoding of RGBA pixel buffers.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use csvgrid_core::{Error, Result};

fn encode<W: Write>(writer: W, rgba: &[u8], width: usize, height: usize) -> Result<()> {
    if width == 0 || height == 0 || rgba.len() != width * height * 4 {
        return Err(Error::InvalidDimensions { width, height });
    }
    let (w, h) = match (u32::try_from(width), u32::try_from(height)) {
        (Ok(w), Ok(h)) => (w, h),
        _ => return Err(Error::InvalidDimensions { width, height }),
    };

    let mut encoder = png::Encoder::new(writer, w, h);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);

    let mut writer = encoder
        .write_header()
        .map_err(|e| Error::Other(format!("PNG header: {e}")))?;
    writer
        .write_image_data(rgba)
        .map_err(|e| Error::Other(format!("PNG data: {e}")))?;
    writer
        .finish()
        .map_err(|e| Error::Other(format!("PNG finish: {e}")))?;
    Ok(())
}

/// Write an 8-bit RGBA image to `path`.
///
/// # Errors
///
/// Returns an error if the buffer does not match `width × height`, or if
/// file creation or encoding fails.
pub fn write_png<P: AsRef<Path>>(rgba: &[u8], width: usize, height: usize, path: P) -> Result<()> {
    let file = File::create(path)?;
    encode(BufWriter::new(file), rgba, width, height)
}

/// Encode an 8-bit RGBA image into PNG bytes.
pub fn png_bytes(rgba: &[u8], width: usize, height: usize) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    encode(&mut buffer, rgba, width, height)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

    #[test]
    fn bytes_start_with_signature() {
        let bytes = png_bytes(&[255; 2 * 3 * 4], 2, 3).unwrap();
        assert_eq!(&bytes[..8], &PNG_MAGIC);
    }

    #[test]
    fn mismatched_buffer_is_rejected() {
        let err = png_bytes(&[0; 12], 2, 2).unwrap_err();
        assert!(matches!(err, Error::InvalidDimensions { width: 2, height: 2 }));
    }

    #[test]
    fn writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("field.png");
        write_png(&[0; 4], 1, 1, &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..8], &PNG_MAGIC);
    }
}
