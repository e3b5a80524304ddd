//! Network-synchronized time base
//!
//! The [`Clock`] owns the RTC collaborator and a fixed UTC offset. A
//! successful sync programs the RTC with local time; reads go straight to the
//! RTC on every call, nothing is cached.
//!
//! ## Failure semantics
//! A failed query never touches the RTC or the stored sync time. When every
//! attempt of [`Clock::sync_with_retries`] fails the error is returned as
//! [`ClockError::SyncExhausted`] and [`Clock::status`] reports
//! `Unsynchronized` (never synced) or `Stale` (synced before); the caller
//! decides whether to carry on in that degraded mode.

use embedded_hal_async::delay::DelayNs;
use hal_abstractions::{CivilDateTime, RealTimeClock};

use crate::calendar;
use crate::error::{ClockError, FetchError};
use crate::ntp::{EpochTime, TimeSource};
use crate::period;
use crate::status::SyncStatus;

/// Fixed offset from UTC in whole hours
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockOffset(i8);

impl ClockOffset {
    pub const UTC: Self = Self(0);

    /// Offsets outside -12..=14 hours do not exist on Earth
    pub const fn from_hours(hours: i8) -> Option<Self> {
        if hours >= -12 && hours <= 14 {
            Some(Self(hours))
        } else {
            None
        }
    }

    pub const fn hours(self) -> i8 {
        self.0
    }

    pub const fn seconds(self) -> i64 {
        self.0 as i64 * 3600
    }

    /// Shift a UTC instant to local seconds since 1970, clamped at zero
    pub fn to_local(self, utc: EpochTime) -> u64 {
        (utc.secs() as i64)
            .saturating_add(self.seconds())
            .max(0) as u64
    }
}

/// How often and how patiently to retry a sync
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RetryPolicy {
    /// Total queries, including the first; 0 behaves as 1
    pub max_attempts: u8,
    /// Pause between failed attempts, not applied after the last one
    pub backoff_ms: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_ms: 2000,
        }
    }
}

/// Synchronized time base over an RTC
pub struct Clock<R> {
    rtc: R,
    offset: ClockOffset,
    last_sync: Option<EpochTime>,
    status: SyncStatus,
}

impl<R: RealTimeClock> Clock<R> {
    pub fn new(rtc: R, offset: ClockOffset) -> Self {
        Self {
            rtc,
            offset,
            last_sync: None,
            status: SyncStatus::Unsynchronized,
        }
    }

    pub fn offset(&self) -> ClockOffset {
        self.offset
    }

    /// UTC time of the last successful sync
    pub fn last_sync(&self) -> Option<EpochTime> {
        self.last_sync
    }

    pub fn status(&self) -> SyncStatus {
        self.status
    }

    /// Query `host` once and program the RTC with local time
    ///
    /// On any error the RTC and stored state are left as they were.
    pub async fn sync<S: TimeSource>(
        &mut self,
        source: &mut S,
        host: &str,
    ) -> Result<EpochTime, ClockError> {
        let utc = source.fetch(host).await?;
        let local = calendar::civil_from_secs(self.offset.to_local(utc));

        self.rtc
            .set_datetime(local)
            .map_err(|_| ClockError::Rtc)?;
        self.last_sync = Some(utc);
        self.status = SyncStatus::Synchronized;

        info!(
            "RTC set to {} (UTC offset {}h)",
            calendar::Ctime(local),
            self.offset.hours()
        );
        Ok(utc)
    }

    /// [`Clock::sync`] up to `policy.max_attempts` times, stopping at the
    /// first success
    ///
    /// Timeouts and malformed replies both use up an attempt. An RTC error
    /// ends the loop immediately since another query cannot fix it.
    pub async fn sync_with_retries<S: TimeSource, D: DelayNs>(
        &mut self,
        source: &mut S,
        host: &str,
        policy: &RetryPolicy,
        delay: &mut D,
    ) -> Result<EpochTime, ClockError> {
        let attempts = policy.max_attempts.max(1);
        let mut last = FetchError::NetworkTimeout;

        for attempt in 1..=attempts {
            info!("Attempting NTP sync with {} (attempt {})", host, attempt);
            match self.sync(source, host).await {
                Ok(utc) => return Ok(utc),
                Err(ClockError::Fetch(e)) => {
                    warn!("NTP sync failed: {:?}", e);
                    last = e;
                    if attempt < attempts && policy.backoff_ms > 0 {
                        delay.delay_ms(policy.backoff_ms).await;
                    }
                }
                Err(e) => {
                    error!("NTP sync aborted: {:?}", e);
                    return Err(e);
                }
            }
        }

        if self.status == SyncStatus::Synchronized {
            self.status = SyncStatus::Stale;
        }
        warn!(
            "All {} NTP sync attempts failed, clock is {:?}",
            attempts, self.status
        );
        Err(ClockError::SyncExhausted { attempts, last })
    }

    /// Current local time from the RTC
    pub fn now(&mut self) -> Result<CivilDateTime, ClockError> {
        self.rtc.now().map_err(|_| ClockError::Rtc)
    }

    /// Seconds elapsed since local midnight, in `[0, 86400)`
    ///
    /// Read from the RTC on every call.
    pub fn seconds_since_midnight(&mut self) -> Result<u32, ClockError> {
        let tod = self.rtc.time_of_day().map_err(|_| ClockError::Rtc)?;
        Ok(period::seconds_since_midnight(
            tod.hour, tod.minute, tod.second,
        ))
    }

    /// Give the RTC back
    pub fn release(self) -> R {
        self.rtc
    }
}
