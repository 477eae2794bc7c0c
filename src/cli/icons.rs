//! Console output icons.

use console::{style, StyledObject};

/// Green check.
pub fn success() -> StyledObject<&'static str> {
    style("✓").green()
}

/// Cyan arrow.
pub fn info() -> StyledObject<&'static str> {
    style("→").cyan()
}

/// Yellow bang.
pub fn warn() -> StyledObject<&'static str> {
    style("!").yellow()
}

/// Red cross.
pub fn error() -> StyledObject<&'static str> {
    style("✗").red()
}

/// Dim arrow for secondary lines.
pub fn dim_arrow() -> StyledObject<&'static str> {
    style("→").dim()
}
