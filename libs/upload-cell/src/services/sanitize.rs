// =====================================================================================
// IMAGE SANITIZER - RASTER RE-ENCODE
// =====================================================================================

use std::io::Cursor;

use image::ImageFormat;
use tracing::{debug, instrument};

use crate::models::{UploadError, UploadedFile};

/// Decodes the image to raw pixels and re-serializes it. Anything that is not
/// pixel data (EXIF, ICC profiles, trailing polyglot payloads, comment
/// blocks) does not survive the round trip.
pub struct ImageSanitizer;

impl ImageSanitizer {
    /// Returns the clean bytes and the content type they were encoded as.
    /// JPEG stays JPEG; every other raster input is normalized to PNG.
    #[instrument(skip(file), fields(filename = %file.filename))]
    pub fn re_encode(file: &UploadedFile) -> Result<(Vec<u8>, String), UploadError> {
        let img = image::load_from_memory(&file.data)
            .map_err(|e| UploadError::Sanitization(format!("decode failed: {}", e)))?;

        let (format, content_type) = if file.content_type.eq_ignore_ascii_case("image/jpeg") {
            (ImageFormat::Jpeg, "image/jpeg")
        } else {
            (ImageFormat::Png, "image/png")
        };

        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, format)
            .map_err(|e| UploadError::Sanitization(format!("re-encode failed: {}", e)))?;

        debug!(
            original_bytes = file.data.len(),
            clean_bytes = out.get_ref().len(),
            "image re-encoded"
        );

        Ok((out.into_inner(), content_type.to_string()))
    }
}
