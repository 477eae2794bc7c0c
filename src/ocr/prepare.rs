//! Image gates and cropping before recognition.

use std::path::Path;

use image::{GenericImageView, ImageFormat, ImageReader};
use tempfile::NamedTempFile;

use super::backend::OcrError;

/// Largest download accepted, in bytes.
pub const MAX_IMAGE_BYTES: u64 = 3 * 1024 * 1024;
/// Images wider or taller than this are cropped.
pub const MAX_DIMENSION: u32 = 1200;
/// Images with more pixels than this are cropped.
pub const MAX_PIXELS: u64 = 12_000_000;
/// Height kept from the top of a cropped image.
pub const CROP_HEIGHT: u32 = 500;

/// Whether the payload starts with a GIF signature.
pub fn is_gif_signature(bytes: &[u8]) -> bool {
    bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a")
}

/// Whether a URL points at a GIF by its path.
pub fn is_gif_url(url: &str) -> bool {
    let path = match url::Url::parse(url) {
        Ok(parsed) => parsed.path().to_ascii_lowercase(),
        Err(_) => url.to_ascii_lowercase(),
    };
    path.contains(".gif")
}

/// Sniff the payload and return the file extension to store it under.
pub fn image_extension(bytes: &[u8]) -> Result<&'static str, OcrError> {
    match infer::get(bytes) {
        Some(kind) if kind.matcher_type() == infer::MatcherType::Image => Ok(kind.extension()),
        Some(kind) => Err(OcrError::NotAnImage(kind.mime_type().to_string())),
        None => Err(OcrError::NotAnImage("unknown content".to_string())),
    }
}

/// Whether an image of this size should be cropped before OCR.
pub fn needs_crop(width: u32, height: u32) -> bool {
    width > MAX_DIMENSION
        || height > MAX_DIMENSION
        || u64::from(width) * u64::from(height) > MAX_PIXELS
}

/// Crop the top `CROP_HEIGHT` pixels into a new temp file in `dir`.
///
/// Returns `None` when the image is small enough to use as is. Blocking;
/// run it on the blocking pool.
pub fn crop_if_oversized(path: &Path, dir: &Path) -> Result<Option<NamedTempFile>, OcrError> {
    let img = ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| OcrError::ImageError(e.to_string()))?;
    let (width, height) = img.dimensions();
    if !needs_crop(width, height) {
        return Ok(None);
    }

    let cropped = img.crop_imm(0, 0, width, height.min(CROP_HEIGHT));
    let out = tempfile::Builder::new()
        .prefix("ocr-crop-")
        .suffix(".png")
        .tempfile_in(dir)?;
    cropped
        .save_with_format(out.path(), ImageFormat::Png)
        .map_err(|e| OcrError::ImageError(e.to_string()))?;
    Ok(Some(out))
}
