//! OCR for blog images and stickers.
//!
//! - `backend`: the recognizer trait and its errors
//! - `tesseract`: the Tesseract command-line backend (Korean model)
//! - `prepare`: size/format gates and cropping of downloaded images
//! - `text`: output cleanup and the page-segmentation fallback loop
//! - `sentinel`: bracketed placeholders returned instead of text

mod backend;
mod prepare;
pub mod sentinel;
mod tesseract;
mod text;

pub use backend::{OcrBackend, OcrConfig, OcrError};
pub use prepare::{
    crop_if_oversized, image_extension, is_gif_signature, is_gif_url, needs_crop,
    MAX_IMAGE_BYTES,
};
pub use tesseract::TesseractBackend;
pub use text::{clean_ocr_output, recognize_with_fallback, MAX_OCR_CHARS};
