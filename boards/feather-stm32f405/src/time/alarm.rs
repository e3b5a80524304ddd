#![deny(unsafe_code)]
#![deny(warnings)]
//! TIM5 as the periodic tick alarm
//!
//! TIM5 is a 32-bit general purpose timer on APB1. Periods of several
//! minutes need the prescaler as well; [`AlarmTiming`] picks the pair. The
//! update interrupt is bound to an RTIC hardware task, which calls
//! [`Tim5Alarm::acknowledge`] before anything else.

use binclock_core::AlarmTiming;
use defmt::{info, Format};
use embassy_stm32::pac;
use hal_abstractions::PeriodicAlarm;

#[derive(Debug, Clone, Copy, Format)]
pub enum AlarmError {
    /// Interval does not fit prescaler and reload
    OutOfRange,
}

pub struct Tim5Alarm {
    timer_clock_hz: u32,
}

impl Tim5Alarm {
    /// Enable the TIM5 bus clock; the counter stays stopped
    pub fn new(timer_clock_hz: u32) -> Self {
        pac::RCC.apb1enr().modify(|w| w.set_tim5en(true));
        Self { timer_clock_hz }
    }

    /// Clear the update flag; call first thing in the interrupt handler
    pub fn acknowledge() {
        pac::TIM5.sr().modify(|w| w.set_uif(false));
    }
}

impl PeriodicAlarm for Tim5Alarm {
    type Error = AlarmError;

    fn start_periodic(&mut self, interval_micros: u64) -> Result<(), AlarmError> {
        let timing = AlarmTiming::for_interval(self.timer_clock_hz, interval_micros)
            .ok_or(AlarmError::OutOfRange)?;

        let tim = pac::TIM5;
        tim.cr1().modify(|w| w.set_cen(false));
        tim.psc().write_value(timing.prescaler);
        tim.arr().write_value(timing.reload);
        tim.cnt().write_value(0);
        // Latch the prescaler now; the update flag this raises is cleared
        // before the interrupt is enabled
        tim.egr().write(|w| w.set_ug(true));
        tim.sr().modify(|w| w.set_uif(false));
        tim.dier().modify(|w| w.set_uie(true));
        tim.cr1().modify(|w| w.set_cen(true));

        info!(
            "TIM5 running: psc={} arr={} ({} us)",
            timing.prescaler,
            timing.reload,
            timing.interval_micros(self.timer_clock_hz)
        );
        Ok(())
    }

    fn stop(&mut self) {
        let tim = pac::TIM5;
        tim.dier().modify(|w| w.set_uie(false));
        tim.cr1().modify(|w| w.set_cen(false));
    }
}
