//! Hardware abstraction traits for the binary clock firmware
//!
//! This crate defines the traits that separate the board support package
//! from the platform-agnostic clock logic in `binclock-core`. BSPs implement
//! these traits; `binclock-core` only ever talks to them.
//!
//! - [`rtc::RealTimeClock`]: wall-clock hardware that can be set and read
//! - [`net::UdpExchange`]: one datagram request/reply round trip with a timeout
//! - [`alarm::PeriodicAlarm`]: a repeating hardware alarm that raises an interrupt
//!
//! Digital output lines are not abstracted here: `embedded_hal::digital::OutputPin`
//! already covers them.

#![no_std]
#![deny(unsafe_code)]

pub mod alarm;
pub mod net;
pub mod rtc;

pub use alarm::PeriodicAlarm;
pub use net::{UdpError, UdpExchange};
pub use rtc::{CivilDateTime, RealTimeClock, TimeOfDay};
