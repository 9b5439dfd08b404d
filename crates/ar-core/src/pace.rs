//! Reading pace

use std::time::Duration;

/// Slowest pace accepted from persisted preferences
pub const MIN_WPM: u32 = 50;

/// Fastest pace accepted from persisted preferences
pub const MAX_WPM: u32 = 600;

/// Pace used when no preference has been stored
pub const DEFAULT_WPM: u32 = 250;

/// Clamp a stored words-per-minute value into the supported range
#[inline]
pub fn clamp_wpm(wpm: u32) -> u32 {
    wpm.clamp(MIN_WPM, MAX_WPM)
}

/// Milliseconds each word stays highlighted.
///
/// A zero pace is treated as one word per minute.
#[inline]
pub fn ms_per_word(wpm: u32) -> f64 {
    60_000.0 / wpm.max(1) as f64
}

/// Tick interval for the word clock
#[inline]
pub fn word_interval(wpm: u32) -> Duration {
    Duration::from_secs_f64(ms_per_word(wpm) / 1000.0)
}
