//! Real-time clock abstraction

/// Calendar date and time as held by an RTC peripheral
///
/// No timezone is attached; the clock stores whatever local time it was set to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CivilDateTime {
    pub year: u16,
    /// 1-12
    pub month: u8,
    /// 1-31
    pub day: u8,
    /// ISO weekday, 1 = Monday ... 7 = Sunday
    pub weekday: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl CivilDateTime {
    /// Hour, minute and second fields only
    pub const fn time_of_day(&self) -> TimeOfDay {
        TimeOfDay {
            hour: self.hour,
            minute: self.minute,
            second: self.second,
        }
    }
}

/// Time-of-day fields read back from an RTC
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimeOfDay {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

/// Wall-clock hardware
///
/// Implementations are expected to keep counting on their own between
/// writes (LSE-driven RTC, battery-backed chip, ...).
pub trait RealTimeClock {
    /// Hardware error type
    type Error: core::fmt::Debug;

    /// Program the clock with a new date and time
    fn set_datetime(&mut self, datetime: CivilDateTime) -> Result<(), Self::Error>;

    /// Read the current date and time
    fn now(&mut self) -> Result<CivilDateTime, Self::Error>;

    /// Read only the hour/minute/second fields
    fn time_of_day(&mut self) -> Result<TimeOfDay, Self::Error> {
        self.now().map(|dt| dt.time_of_day())
    }
}
