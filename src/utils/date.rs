//! Post date helpers.

/// First year of the recent era.
pub const RECENT_ERA_START_YEAR: i32 = 2025;

/// Whether a `YYYYMMDD` post date falls in the recent era.
///
/// Dates whose first four characters are not a year are legacy.
pub fn is_recent_era(post_date: &str) -> bool {
    post_date
        .get(..4)
        .and_then(|year| year.parse::<i32>().ok())
        .map(|year| year >= RECENT_ERA_START_YEAR)
        .unwrap_or(false)
}
