//! Datagram transport abstraction

use core::future::Future;

/// Errors reported by a [`UdpExchange`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UdpError {
    /// Host name could not be resolved
    Dns,
    /// Socket bind/send/receive error
    Socket,
    /// No reply arrived before the deadline
    Timeout,
}

impl core::fmt::Display for UdpError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Dns => write!(f, "DNS resolution failed"),
            Self::Socket => write!(f, "Socket error"),
            Self::Timeout => write!(f, "Request timeout"),
        }
    }
}

impl core::error::Error for UdpError {}

/// One UDP request/reply round trip
///
/// Each call opens its own socket, sends `request` to `host:port`, waits at
/// most `timeout_ms` for a single datagram from that host and closes the
/// socket again. No state is kept between calls.
pub trait UdpExchange {
    /// Returns the number of bytes written to `response`.
    ///
    /// A reply longer than `response` must not be silently truncated to look
    /// valid; implementations either report its full length or fail.
    fn exchange(
        &mut self,
        host: &str,
        port: u16,
        request: &[u8],
        response: &mut [u8],
        timeout_ms: u64,
    ) -> impl Future<Output = Result<usize, UdpError>>;
}
