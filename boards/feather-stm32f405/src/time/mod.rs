#![deny(unsafe_code)]
#![deny(warnings)]
//! Board time hardware: the LSE-driven RTC and the TIM5 tick alarm

mod alarm;
mod rtc;

pub use alarm::{AlarmError, Tim5Alarm};
pub use rtc::{RtcError, StmRtc};
