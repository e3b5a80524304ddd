#![deny(unsafe_code)]
#![deny(warnings)]
//! DHCP bring-up

use defmt::{info, warn};
use embassy_net::Stack;
use embassy_time::{with_timeout, Duration};

/// Wait for a DHCP lease and log the address
///
/// Returns `false` if no lease arrived within `timeout_secs`; the caller
/// then starts without network time.
pub async fn wait_for_config(stack: &Stack<'_>, timeout_secs: u32) -> bool {
    info!("Waiting for DHCP (up to {} s)...", timeout_secs);
    if with_timeout(
        Duration::from_secs(timeout_secs as u64),
        stack.wait_config_up(),
    )
    .await
    .is_err()
    {
        warn!("No DHCP lease after {} s", timeout_secs);
        return false;
    }
    info!("Network is UP!");

    if let Some(config) = stack.config_v4() {
        let octets = config.address.address().octets();
        info!(
            "IP: {}.{}.{}.{}",
            octets[0], octets[1], octets[2], octets[3]
        );

        if let Some(gateway) = config.gateway {
            let gw = gateway.octets();
            info!("Gateway: {}.{}.{}.{}", gw[0], gw[1], gw[2], gw[3]);
        }
    }
    true
}
