//! Configuration structures

use crate::clock::{ClockOffset, RetryPolicy};
use crate::error::ConfigError;

/// SNTP client configuration
#[derive(Debug, Clone, Copy)]
pub struct SntpConfig {
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
    /// Maximum accepted stratum level (1-15), `None` to accept any
    pub max_stratum: Option<u8>,
}

impl Default for SntpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 1000,
            max_stratum: None,
        }
    }
}

/// Clock process parameters
#[derive(Debug, Clone)]
pub struct ClockConfig {
    /// NTP server to query
    pub ntp_host: &'static str,
    /// Fixed offset from UTC in whole hours
    pub utc_offset_hours: i8,
    /// Sync attempts before giving up
    pub sync_attempts: u8,
    /// Delay between failed attempts
    pub retry_backoff_ms: u32,
    /// Explicit periodic re-sync; `None` syncs only at boot
    pub resync_interval_secs: Option<u32>,
    /// How long to wait for the network before starting unsynchronized
    pub network_timeout_secs: u32,
    pub sntp: SntpConfig,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            ntp_host: "pool.ntp.org",
            utc_offset_hours: 0,
            sync_attempts: 3,
            retry_backoff_ms: 2000,
            resync_interval_secs: None,
            network_timeout_secs: 30,
            sntp: SntpConfig::default(),
        }
    }
}

impl ClockConfig {
    /// Check every field for a usable value
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ntp_host.is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        if self.sync_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        if self.sntp.timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        self.offset()?;
        Ok(())
    }

    pub fn offset(&self) -> Result<ClockOffset, ConfigError> {
        ClockOffset::from_hours(self.utc_offset_hours)
            .ok_or(ConfigError::OffsetOutOfRange(self.utc_offset_hours))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.sync_attempts,
            backoff_ms: self.retry_backoff_ms,
        }
    }
}
