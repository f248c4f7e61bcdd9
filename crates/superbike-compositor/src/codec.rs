use std::io::Cursor;

use image::{DynamicImage, ImageFormat, RgbImage};

use crate::error::{CompositeError, Result};

/// Decode an uploaded photo; only PNG and JPEG are accepted
pub fn decode_upload(bytes: &[u8]) -> Result<DynamicImage> {
    let format = image::guess_format(bytes).map_err(CompositeError::Decode)?;

    if !matches!(format, ImageFormat::Png | ImageFormat::Jpeg) {
        return Err(CompositeError::UnsupportedFormat(format!("{format:?}")));
    }

    image::load_from_memory_with_format(bytes, format).map_err(CompositeError::Decode)
}

/// Decode provider output in any format the `image` crate recognizes
pub fn decode_generated(bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes).map_err(CompositeError::Decode)
}

/// MIME type of an accepted upload, derived from its magic bytes
pub fn upload_mime_type(bytes: &[u8]) -> Option<&'static str> {
    match image::guess_format(bytes).ok()? {
        ImageFormat::Png => Some("image/png"),
        ImageFormat::Jpeg => Some("image/jpeg"),
        _ => None,
    }
}

/// Encode the final image as PNG
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(CompositeError::Encode)?;
    Ok(buffer.into_inner())
}
