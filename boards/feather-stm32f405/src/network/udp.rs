#![deny(unsafe_code)]
#![deny(warnings)]
//! One-shot UDP exchange over embassy-net

use defmt::{debug, warn, Debug2Format};
use embassy_futures::select::{select, Either};
use embassy_net::dns::DnsQueryType;
use embassy_net::udp::{PacketMetadata, RecvError, UdpSocket};
use embassy_net::{IpEndpoint, Stack};
use embassy_time::{Duration, Timer};
use hal_abstractions::{UdpError, UdpExchange};

const BUF_LEN: usize = 128;

/// [`UdpExchange`] backed by the embassy-net stack
///
/// Resolves the host, then opens a fresh socket on an ephemeral port for
/// each exchange. Datagrams from any other address are dropped.
pub struct EmbassyUdp {
    stack: Stack<'static>,
}

impl EmbassyUdp {
    pub fn new(stack: Stack<'static>) -> Self {
        Self { stack }
    }
}

impl UdpExchange for EmbassyUdp {
    async fn exchange(
        &mut self,
        host: &str,
        port: u16,
        request: &[u8],
        response: &mut [u8],
        timeout_ms: u64,
    ) -> Result<usize, UdpError> {
        let server_ip = self
            .stack
            .dns_query(host, DnsQueryType::A)
            .await
            .map_err(|e| {
                warn!("DNS query for {} failed: {:?}", host, e);
                UdpError::Dns
            })?
            .first()
            .copied()
            .ok_or(UdpError::Dns)?;
        let endpoint = IpEndpoint::new(server_ip, port);
        debug!("Resolved {} to {}", host, Debug2Format(&endpoint));

        let mut rx_meta = [PacketMetadata::EMPTY; 2];
        let mut rx_buffer = [0u8; BUF_LEN];
        let mut tx_meta = [PacketMetadata::EMPTY; 1];
        let mut tx_buffer = [0u8; BUF_LEN];
        let mut socket = UdpSocket::new(
            self.stack,
            &mut rx_meta,
            &mut rx_buffer,
            &mut tx_meta,
            &mut tx_buffer,
        );

        socket.bind(0).map_err(|e| {
            warn!("UDP bind failed: {:?}", e);
            UdpError::Socket
        })?;
        socket.send_to(request, endpoint).await.map_err(|e| {
            warn!("UDP send failed: {:?}", e);
            UdpError::Socket
        })?;

        let recv = async {
            loop {
                match socket.recv_from(response).await {
                    Ok((len, meta)) if meta.endpoint.addr == server_ip => return Ok(len),
                    Ok((_, meta)) => {
                        warn!("Dropping datagram from {}", Debug2Format(&meta.endpoint));
                    }
                    // Longer than the buffer: report the full buffer so the
                    // caller sees a wrong-size reply
                    Err(RecvError::Truncated) => return Ok(response.len()),
                }
            }
        };

        match select(Timer::after(Duration::from_millis(timeout_ms)), recv).await {
            Either::First(_) => {
                warn!("UDP receive timeout after {}ms", timeout_ms);
                Err(UdpError::Timeout)
            }
            Either::Second(result) => result,
        }
    }
}
