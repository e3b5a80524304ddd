//! Calendar date/time conversions using O(1) algorithms
//!
//! Implements Howard Hinnant's civil_from_days and days_from_civil algorithms.
//! Reference: http://howardhinnant.github.io/date_algorithms.html
//!
//! Seconds are counted from 1970-01-01 00:00:00 in whatever zone the caller
//! already applied; no timezone or leap-second handling happens here.

use hal_abstractions::CivilDateTime;

const SECONDS_PER_DAY: u64 = 86_400;

/// Days from 0000-03-01 to 1970-01-01
const EPOCH_SHIFT_DAYS: i64 = 719_468;

const WEEKDAY_NAMES: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Gregorian leap year rule
pub fn is_leap_year(year: u16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Number of days in `month` of `year`, 0 for an invalid month
pub fn days_in_month(year: u16, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

/// Whether every field of `dt` lies in its calendar range
pub fn is_valid(dt: &CivilDateTime) -> bool {
    (1..=12).contains(&dt.month)
        && dt.day >= 1
        && dt.day <= days_in_month(dt.year, dt.month)
        && (1..=7).contains(&dt.weekday)
        && dt.hour < 24
        && dt.minute < 60
        && dt.second < 60
}

/// Convert seconds since 1970-01-01 to a civil date and time
///
/// Years past `u16::MAX` are not representable; callers stay well inside
/// the NTP eras (1968-2104).
pub fn civil_from_secs(secs: u64) -> CivilDateTime {
    let days = (secs / SECONDS_PER_DAY) as i64;
    let secs_today = secs % SECONDS_PER_DAY;

    let (year, month, day) = civil_from_days(days);

    CivilDateTime {
        year,
        month,
        day,
        weekday: weekday_from_days(days),
        hour: (secs_today / 3600) as u8,
        minute: ((secs_today % 3600) / 60) as u8,
        second: (secs_today % 60) as u8,
    }
}

/// Convert a civil date and time back to seconds since 1970-01-01
///
/// The weekday field is ignored.
pub fn secs_from_civil(dt: &CivilDateTime) -> u64 {
    let days = days_from_civil(dt.year, dt.month, dt.day);
    (days as u64) * SECONDS_PER_DAY
        + (dt.hour as u64) * 3600
        + (dt.minute as u64) * 60
        + (dt.second as u64)
}

/// ISO weekday (1 = Monday) of a day count since 1970-01-01, a Thursday
fn weekday_from_days(days: i64) -> u8 {
    ((days + 3).rem_euclid(7) + 1) as u8
}

fn civil_from_days(days_since_epoch: i64) -> (u16, u8, u8) {
    let z = days_since_epoch + EPOCH_SHIFT_DAYS;

    // 400-year eras
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = (z - era * 146_097) as u64; // [0, 146096]
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365; // [0, 399]
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100); // [0, 365]

    // March-based month [0, 11]
    let mp = (5 * doy + 2) / 153;
    let d = (doy - (153 * mp + 2) / 5 + 1) as u8;
    let m = if mp < 10 { mp + 3 } else { mp - 9 } as u8;
    let year = if m <= 2 { y + 1 } else { y };

    (year as u16, m, d)
}

fn days_from_civil(year: u16, month: u8, day: u8) -> i64 {
    let y = year as i64;
    let m = month as i64;
    let d = day as i64;

    let (y, m) = if m <= 2 { (y - 1, m + 9) } else { (y, m - 3) };

    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = y - era * 400; // [0, 399]
    let doy = (153 * m + 2) / 5 + d - 1; // [0, 365]
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy; // [0, 146096]

    era * 146_097 + doe - EPOCH_SHIFT_DAYS
}

/// `ctime`-style rendering with single spaces: `Thu Jan 1 00:00:00 1970`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ctime(pub CivilDateTime);

impl Ctime {
    fn names(&self) -> (&'static str, &'static str) {
        let dt = &self.0;
        let weekday = WEEKDAY_NAMES
            .get(dt.weekday.wrapping_sub(1) as usize)
            .copied()
            .unwrap_or("???");
        let month = MONTH_NAMES
            .get(dt.month.wrapping_sub(1) as usize)
            .copied()
            .unwrap_or("???");
        (weekday, month)
    }
}

impl core::fmt::Display for Ctime {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let (weekday, month) = self.names();
        let dt = &self.0;
        write!(
            f,
            "{} {} {} {:02}:{:02}:{:02} {}",
            weekday, month, dt.day, dt.hour, dt.minute, dt.second, dt.year
        )
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Ctime {
    fn format(&self, f: defmt::Formatter) {
        let (weekday, month) = self.names();
        let dt = &self.0;
        defmt::write!(
            f,
            "{=str} {=str} {} {=u8:02}:{=u8:02}:{=u8:02} {}",
            weekday,
            month,
            dt.day,
            dt.hour,
            dt.minute,
            dt.second,
            dt.year
        )
    }
}
