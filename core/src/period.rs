//! Day and period arithmetic
//!
//! A day is split into `2^D` equal periods, where `D` is the number of
//! display lines. All conversions between wall-clock time and counter state
//! go through this module so there is exactly one formula for each.

/// Seconds in one civil day (leap seconds ignored)
pub const SECONDS_PER_DAY: u32 = 86_400;

/// Microseconds in one civil day
pub const MICROS_PER_DAY: u64 = 86_400_000_000;

/// Widest supported display; keeps every counter state inside a `u32`
pub const MAX_LINES: usize = 32;

/// Number of periods per day for a `lines`-wide display (`2^lines`)
pub const fn period_count(lines: usize) -> u64 {
    1u64 << lines
}

/// Hardware alarm interval for a `lines`-wide display
///
/// Integer division; the sub-microsecond remainder is dropped.
pub const fn micros_per_period(lines: usize) -> u64 {
    MICROS_PER_DAY / period_count(lines)
}

/// Counter state for a given time of day
///
/// `floor(seconds_since_midnight * 2^lines / 86400)`: the fraction of the day
/// already elapsed, scaled to the period count. Out-of-range input is clamped
/// to the last second of the day.
pub const fn state_at(seconds_since_midnight: u32, lines: usize) -> u32 {
    let secs = if seconds_since_midnight >= SECONDS_PER_DAY {
        SECONDS_PER_DAY - 1
    } else {
        seconds_since_midnight
    };
    ((secs as u64 * period_count(lines)) / SECONDS_PER_DAY as u64) as u32
}

/// Fold hour/minute/second fields into seconds since midnight
///
/// Fields past their range (leap second, corrupted RTC read) are clamped so
/// the result always lies in `[0, 86400)`.
pub const fn seconds_since_midnight(hour: u8, minute: u8, second: u8) -> u32 {
    let total = hour as u32 * 3600 + minute as u32 * 60 + second as u32;
    if total >= SECONDS_PER_DAY {
        SECONDS_PER_DAY - 1
    } else {
        total
    }
}
