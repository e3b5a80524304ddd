//! Platform-agnostic core logic for the binary clock firmware
//!
//! Keeps a real-time clock synchronized to network time and drives a bank of
//! `D` binary-weighted output lines as a wrapping counter that advances
//! `2^D` times per day. This crate has NO hardware dependencies: everything
//! external is reached through the traits in `hal-abstractions` and
//! `embedded-hal`.
//!
//! ## Data flow
//! ```text
//! TimeSource --fetch--> Clock --seconds since midnight--> PeriodCounter --state--> Display
//! ```
//!
//! ## Control flow at steady state
//! ```text
//! hardware alarm -> interrupt -> Scheduler::on_alarm (flag only)
//! idle loop -> Scheduler::dispatch -> PeriodCounter::tick -> Display::render
//! ```
//!
//! ## Modules
//! - **`ntp`**: SNTP request/reply codec and the UDP-backed [`TimeSource`]
//! - **`clock`**: the synchronized time base with retry policy
//! - **`counter`**: the wrapping per-period state machine
//! - **`display`**: MSB-first binary frames written to output lines
//! - **`scheduler`**: interrupt/idle-loop hand-off and alarm timing
//! - **`period`**: day/period arithmetic shared by the above
//! - **`calendar`**: epoch <-> civil date conversions
//! - **`status`**: observable synchronization status
//! - **`config`**: configuration structs with `Default` implementations
//! - **`error`**: error enums for every layer

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod calendar;
pub mod clock;
pub mod config;
pub mod counter;
pub mod display;
pub mod error;
pub mod ntp;
pub mod period;
pub mod scheduler;
pub mod status;

// Re-export commonly used types
pub use clock::{Clock, ClockOffset, RetryPolicy};
pub use config::{ClockConfig, SntpConfig};
pub use counter::PeriodCounter;
pub use display::{Display, DisplayFrame};
pub use error::{ClockError, ConfigError, FetchError};
pub use ntp::{EpochTime, SntpSource, TimeSource};
pub use scheduler::{AlarmTiming, Scheduler};
pub use status::{SyncIndicator, SyncStatus};
