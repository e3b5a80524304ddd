//! Error types for time synchronization and configuration

use hal_abstractions::UdpError;

/// Errors from a single network time query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FetchError {
    /// No reply within the request timeout
    NetworkTimeout,
    /// Reply had the wrong size or an unusable timestamp
    MalformedResponse,
    /// DNS or socket failure before a reply could be awaited
    Network,
}

impl From<UdpError> for FetchError {
    fn from(e: UdpError) -> Self {
        match e {
            UdpError::Timeout => FetchError::NetworkTimeout,
            UdpError::Dns | UdpError::Socket => FetchError::Network,
        }
    }
}

impl core::fmt::Display for FetchError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NetworkTimeout => write!(f, "Network timeout"),
            Self::MalformedResponse => write!(f, "Malformed NTP response"),
            Self::Network => write!(f, "Network error"),
        }
    }
}

impl core::error::Error for FetchError {}

/// Clock operation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockError {
    /// The time query failed; stored state is unchanged
    Fetch(FetchError),
    /// RTC hardware rejected a read or write
    Rtc,
    /// Every configured attempt failed; stored state is unchanged
    SyncExhausted {
        /// Number of queries made
        attempts: u8,
        /// Failure of the final query
        last: FetchError,
    },
}

impl ClockError {
    /// Whether another sync attempt may succeed
    ///
    /// Timeouts and malformed replies both count as a failed attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Fetch(_))
    }
}

impl From<FetchError> for ClockError {
    fn from(e: FetchError) -> Self {
        ClockError::Fetch(e)
    }
}

impl core::fmt::Display for ClockError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Fetch(e) => write!(f, "Time query failed: {}", e),
            Self::Rtc => write!(f, "RTC hardware error"),
            Self::SyncExhausted { attempts, last } => {
                write!(f, "Sync failed after {} attempts (last: {})", attempts, last)
            }
        }
    }
}

impl core::error::Error for ClockError {}

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// NTP host name is empty
    EmptyHost,
    /// Sync attempt count must be at least one
    ZeroAttempts,
    /// UTC offset outside -12..=14 hours
    OffsetOutOfRange(i8),
    /// NTP request timeout must be non-zero
    ZeroTimeout,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::EmptyHost => write!(f, "NTP host is empty"),
            Self::ZeroAttempts => write!(f, "Sync attempt count is zero"),
            Self::OffsetOutOfRange(h) => write!(f, "UTC offset {}h out of range", h),
            Self::ZeroTimeout => write!(f, "NTP timeout is zero"),
        }
    }
}

impl core::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_udp_error_mapping() {
        assert_eq!(FetchError::from(UdpError::Timeout), FetchError::NetworkTimeout);
        assert_eq!(FetchError::from(UdpError::Dns), FetchError::Network);
        assert_eq!(FetchError::from(UdpError::Socket), FetchError::Network);
    }

    #[test]
    fn test_retryable() {
        assert!(ClockError::Fetch(FetchError::NetworkTimeout).is_retryable());
        assert!(ClockError::Fetch(FetchError::MalformedResponse).is_retryable());
        assert!(!ClockError::Rtc.is_retryable());
        assert!(!ClockError::SyncExhausted {
            attempts: 3,
            last: FetchError::NetworkTimeout
        }
        .is_retryable());
    }

    #[test]
    fn test_display() {
        let e = ClockError::SyncExhausted {
            attempts: 3,
            last: FetchError::NetworkTimeout,
        };
        assert_eq!(
            e.to_string(),
            "Sync failed after 3 attempts (last: Network timeout)"
        );
    }
}
