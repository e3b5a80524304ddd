#![deny(unsafe_code)]
#![deny(warnings)]
//! STM32 internal RTC behind [`RealTimeClock`]

use defmt::Format;
use embassy_stm32::rtc::{DateTime, DayOfWeek, Rtc};
use hal_abstractions::{CivilDateTime, RealTimeClock};

/// RTC operation errors
#[derive(Debug, Clone, Copy, Format)]
pub enum RtcError {
    /// Date/time fields the peripheral rejects
    InvalidDateTime,
    /// RTC hardware error
    HardwareError,
}

/// The on-chip RTC, clocked from the 32.768 kHz LSE crystal
///
/// Keeps counting across syncs; the clock logic only writes it after a
/// successful NTP query.
pub struct StmRtc {
    rtc: Rtc,
}

impl StmRtc {
    pub fn new(rtc: Rtc) -> Self {
        Self { rtc }
    }
}

impl RealTimeClock for StmRtc {
    type Error = RtcError;

    fn set_datetime(&mut self, dt: CivilDateTime) -> Result<(), RtcError> {
        let datetime = DateTime::from(
            dt.year,
            dt.month,
            dt.day,
            day_of_week(dt.weekday),
            dt.hour,
            dt.minute,
            dt.second,
            0,
        )
        .map_err(|_| RtcError::InvalidDateTime)?;
        self.rtc
            .set_datetime(datetime)
            .map_err(|_| RtcError::HardwareError)
    }

    fn now(&mut self) -> Result<CivilDateTime, RtcError> {
        let dt = self.rtc.now().map_err(|_| RtcError::HardwareError)?;
        Ok(CivilDateTime {
            year: dt.year(),
            month: dt.month(),
            day: dt.day(),
            weekday: iso_weekday(dt.day_of_week()),
            hour: dt.hour(),
            minute: dt.minute(),
            second: dt.second(),
        })
    }
}

fn day_of_week(iso: u8) -> DayOfWeek {
    match iso {
        1 => DayOfWeek::Monday,
        2 => DayOfWeek::Tuesday,
        3 => DayOfWeek::Wednesday,
        4 => DayOfWeek::Thursday,
        5 => DayOfWeek::Friday,
        6 => DayOfWeek::Saturday,
        _ => DayOfWeek::Sunday,
    }
}

fn iso_weekday(day: DayOfWeek) -> u8 {
    match day {
        DayOfWeek::Monday => 1,
        DayOfWeek::Tuesday => 2,
        DayOfWeek::Wednesday => 3,
        DayOfWeek::Thursday => 4,
        DayOfWeek::Friday => 5,
        DayOfWeek::Saturday => 6,
        DayOfWeek::Sunday => 7,
    }
}
