//! Level derivation.
//!
//! Stars are the only level-bearing currency. The level is a pure function
//! of the star total and is recomputed on every read; it is never stored.

/// Stars needed per level.
pub const STARS_PER_LEVEL: u32 = 50;

/// Level for a star total: `stars / 50 + 1`.
pub const fn level_for_stars(total_stars: u32) -> u32 {
    (total_stars / STARS_PER_LEVEL).saturating_add(1)
}

/// Stars still needed to reach the next level.
pub const fn stars_to_next_level(total_stars: u32) -> u32 {
    STARS_PER_LEVEL.saturating_sub(total_stars % STARS_PER_LEVEL)
}
