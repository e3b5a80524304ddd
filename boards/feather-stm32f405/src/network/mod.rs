#![deny(unsafe_code)]
#![deny(warnings)]
//! Network side of the clock: DHCP bring-up and the UDP transport the SNTP
//! source runs over
//!
//! The embassy-net `Stack` is `!Send` and lives entirely inside the network
//! task; nothing here is shared with the tick path.

pub mod manager;
pub mod udp;

pub use udp::EmbassyUdp;
