//! Placeholders returned instead of OCR text.
//!
//! They are bracketed English so they can never collide with recognized
//! Korean text or match a sponsorship keyword.

pub const GIF: &str = "[GIF not supported]";
pub const TIMEOUT: &str = "[timeout]";
pub const TOO_LARGE: &str = "[image too large]";
pub const NOT_AN_IMAGE: &str = "[not an image]";
pub const DOWNLOAD_FAILED: &str = "[download failed]";
pub const UNRECOGNIZED: &str = "[OCR unrecognized]";
pub const UNAVAILABLE: &str = "[OCR unavailable]";

const ALL: &[&str] = &[
    GIF,
    TIMEOUT,
    TOO_LARGE,
    NOT_AN_IMAGE,
    DOWNLOAD_FAILED,
    UNRECOGNIZED,
    UNAVAILABLE,
];

pub fn is_sentinel(text: &str) -> bool {
    ALL.contains(&text)
}
