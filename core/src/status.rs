//! Synchronization status
//!
//! A failed sync never stops the firmware: the display keeps running from
//! whatever the RTC holds. The status makes that degraded mode observable.

use core::sync::atomic::{AtomicU8, Ordering};

/// Whether the clock reflects network time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum SyncStatus {
    /// No sync has ever succeeded; RTC holds its power-on value
    Unsynchronized = 0,
    /// The most recent sync succeeded
    Synchronized = 1,
    /// An earlier sync succeeded but the most recent one was exhausted
    Stale = 2,
}

impl SyncStatus {
    pub fn is_synchronized(self) -> bool {
        self == Self::Synchronized
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Synchronized,
            2 => Self::Stale,
            _ => Self::Unsynchronized,
        }
    }
}

/// Lock-free copy of the latest [`SyncStatus`]
///
/// Written by whichever context runs the sync, read by status outputs such
/// as a heartbeat LED. Single writer; readers only ever see a whole value.
pub struct SyncIndicator {
    status: AtomicU8,
}

impl SyncIndicator {
    pub const fn new() -> Self {
        Self {
            status: AtomicU8::new(SyncStatus::Unsynchronized as u8),
        }
    }

    pub fn publish(&self, status: SyncStatus) {
        self.status.store(status as u8, Ordering::Release);
    }

    pub fn current(&self) -> SyncStatus {
        SyncStatus::from_u8(self.status.load(Ordering::Acquire))
    }
}

impl Default for SyncIndicator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indicator_starts_unsynchronized() {
        let indicator = SyncIndicator::new();
        assert_eq!(indicator.current(), SyncStatus::Unsynchronized);
        assert!(!indicator.current().is_synchronized());
    }

    #[test]
    fn test_indicator_publish() {
        let indicator = SyncIndicator::new();
        indicator.publish(SyncStatus::Synchronized);
        assert!(indicator.current().is_synchronized());
        indicator.publish(SyncStatus::Stale);
        assert_eq!(indicator.current(), SyncStatus::Stale);
    }
}
