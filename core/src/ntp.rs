//! SNTP time source
//!
//! One client query per call, per RFC 4330 in its simplest form: a 48-byte
//! mode 3 request, and the transmit timestamp seconds of the 48-byte reply.
//! No authentication, no leap-second handling and no round-trip delay
//! compensation.
//!
//! ## Epoch
//! Wire seconds count from 1900-01-01. [`EpochTime`] counts from
//! 1970-01-01; the delta is [`NTP_UNIX_OFFSET`] and no other convention is
//! used anywhere in this crate.

use core::future::Future;

use hal_abstractions::UdpExchange;

use crate::config::SntpConfig;
use crate::error::FetchError;

/// SNTP port (UDP 123)
pub const NTP_PORT: u16 = 123;

/// Request and reply size in bytes
pub const PACKET_LEN: usize = 48;

/// NTP epoch offset (1900-01-01 to 1970-01-01 in seconds)
pub const NTP_UNIX_OFFSET: u64 = 2_208_988_800;

/// Seconds in one 32-bit NTP era
const NTP_ERA_SECS: u64 = 1 << 32;

/// LI=0, VN=3, Mode=3 (client)
const CLIENT_HEADER: u8 = 0x1B;

/// Receive buffer; larger than a reply so oversize datagrams are detected
const RECV_BUF_LEN: usize = 64;

/// Seconds since 1970-01-01 00:00:00 UTC
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EpochTime(pub u64);

impl EpochTime {
    pub const fn secs(self) -> u64 {
        self.0
    }

    /// Convert 32-bit NTP wire seconds
    ///
    /// A value with the top bit set lies in era 0 (1968-2036); otherwise the
    /// counter has wrapped and the value lies in era 1 (2036-2104).
    ///
    /// `None` for era 0 values before 1970-01-01, which have no Unix time.
    pub const fn from_ntp(ntp_secs: u32) -> Option<Self> {
        let secs = ntp_secs as u64;
        let secs = if ntp_secs & 0x8000_0000 != 0 {
            secs
        } else {
            secs + NTP_ERA_SECS
        };
        match secs.checked_sub(NTP_UNIX_OFFSET) {
            Some(unix) => Some(Self(unix)),
            None => None,
        }
    }
}

/// Anything that can report the current network time
pub trait TimeSource {
    /// Query `host` once
    ///
    /// A timeout or malformed reply ends this attempt; retry policy belongs
    /// to the caller.
    fn fetch(&mut self, host: &str) -> impl Future<Output = Result<EpochTime, FetchError>>;
}

/// Build a client request packet
pub fn request_packet() -> [u8; PACKET_LEN] {
    let mut packet = [0u8; PACKET_LEN];
    packet[0] = CLIENT_HEADER;
    packet
}

/// Extract the transmit timestamp from a reply
///
/// The reply must be exactly [`PACKET_LEN`] bytes with a non-zero transmit
/// timestamp. `max_stratum`, when set, also rejects stratum 0 (kiss-o'-death)
/// and servers further than that from a reference clock.
pub fn parse_reply(reply: &[u8], max_stratum: Option<u8>) -> Result<EpochTime, FetchError> {
    if reply.len() != PACKET_LEN {
        warn!("NTP reply is {} bytes, expected {}", reply.len(), PACKET_LEN);
        return Err(FetchError::MalformedResponse);
    }

    if let Some(max) = max_stratum {
        let stratum = reply[1];
        if stratum == 0 || stratum > max {
            warn!("Invalid stratum {} (max {})", stratum, max);
            return Err(FetchError::MalformedResponse);
        }
    }

    let tx_secs = u32::from_be_bytes([reply[40], reply[41], reply[42], reply[43]]);
    if tx_secs == 0 {
        warn!("NTP reply carries no transmit timestamp");
        return Err(FetchError::MalformedResponse);
    }

    EpochTime::from_ntp(tx_secs).ok_or_else(|| {
        warn!("NTP transmit timestamp {} predates 1970", tx_secs);
        FetchError::MalformedResponse
    })
}

/// [`TimeSource`] that speaks SNTP over a [`UdpExchange`]
///
/// Opens and closes one socket per query; no connection state is retained.
pub struct SntpSource<U> {
    transport: U,
    config: SntpConfig,
}

impl<U: UdpExchange> SntpSource<U> {
    /// Create a source with the default 1 second timeout
    pub fn new(transport: U) -> Self {
        Self::with_config(transport, SntpConfig::default())
    }

    pub fn with_config(transport: U, config: SntpConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &SntpConfig {
        &self.config
    }

    /// Give the transport back
    pub fn into_transport(self) -> U {
        self.transport
    }
}

impl<U: UdpExchange> TimeSource for SntpSource<U> {
    async fn fetch(&mut self, host: &str) -> Result<EpochTime, FetchError> {
        let request = request_packet();
        let mut response = [0u8; RECV_BUF_LEN];

        debug!("Sending NTP request to {}", host);
        let len = self
            .transport
            .exchange(
                host,
                NTP_PORT,
                &request,
                &mut response,
                self.config.timeout_ms,
            )
            .await?;

        let reply = response.get(..len).ok_or(FetchError::MalformedResponse)?;
        let epoch = parse_reply(reply, self.config.max_stratum)?;
        info!("NTP time from {}: {} s since 1970", host, epoch.secs());
        Ok(epoch)
    }
}
