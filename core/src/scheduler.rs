//! Interrupt / idle-loop hand-off
//!
//! The alarm interrupt does exactly one thing: [`Scheduler::on_alarm`] sets
//! the pending-tick flag. All real work happens in the idle loop, which sleeps
//! until any interrupt, then [`Scheduler::dispatch`]es at most one tick. Ticks
//! therefore never run inside interrupt context and never overlap. The
//! pending check before sleeping runs with interrupts masked, so an alarm
//! that lands just before the sleep still wakes the core.
//!
//! ## Missed ticks
//! The flag is a single boolean, not a counter. An alarm that fires while the
//! previous tick is still pending is lost and the display falls one period
//! behind. Those alarms are counted so the drift can be logged, but they are
//! not replayed.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use hal_abstractions::PeriodicAlarm;

/// Pending-tick flag shared by the alarm interrupt and the idle loop
///
/// Single writer of `true` (interrupt), single reader-and-clearer (idle).
pub struct Scheduler {
    pending: AtomicBool,
    missed: AtomicU32,
}

impl Scheduler {
    pub const fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
            missed: AtomicU32::new(0),
        }
    }

    /// Interrupt side: mark a tick as pending and return
    pub fn on_alarm(&self) {
        if self.pending.swap(true, Ordering::AcqRel) {
            self.missed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Idle side: read and clear the flag
    pub fn take_pending(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    /// Alarms lost since the last call
    pub fn take_missed(&self) -> u32 {
        self.missed.swap(0, Ordering::Relaxed)
    }

    /// Run `on_tick` once if a tick is pending
    ///
    /// Returns whether a tick was dispatched.
    pub fn dispatch<F: FnOnce()>(&self, on_tick: F) -> bool {
        if !self.take_pending() {
            return false;
        }
        let missed = self.take_missed();
        if missed > 0 {
            warn!("{} tick(s) lost, display is behind by as many periods", missed);
        }
        on_tick();
        true
    }

    /// Whether a tick is waiting, without clearing it
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Run `wait` only if no tick is pending
    ///
    /// Call with interrupts masked and have `wait` be a wait-for-interrupt:
    /// an alarm landing between the check and the sleep then stays pending
    /// and wakes the core instead of being left for the next interrupt.
    pub fn sleep_unless_pending<W: FnOnce()>(&self, wait: W) -> bool {
        if self.is_pending() {
            return false;
        }
        wait();
        true
    }

    /// One idle iteration: `sleep`, then dispatch at most one tick
    pub fn idle_once<S: FnOnce(&Self), F: FnOnce()>(&self, sleep: S, on_tick: F) -> bool {
        sleep(self);
        self.dispatch(on_tick)
    }

    /// The idle loop: [`Scheduler::idle_once`] forever
    ///
    /// `sleep` is expected to call [`Scheduler::sleep_unless_pending`] from
    /// inside a critical section.
    pub fn run_idle<S: FnMut(&Self), F: FnMut()>(&self, mut sleep: S, mut on_tick: F) -> ! {
        loop {
            self.idle_once(&mut sleep, &mut on_tick);
        }
    }

    /// Drop any stale tick and start `alarm` at `interval_micros`
    pub fn arm<A: PeriodicAlarm>(&self, alarm: &mut A, interval_micros: u64) -> Result<(), A::Error> {
        self.pending.store(false, Ordering::Release);
        self.missed.store(0, Ordering::Relaxed);
        alarm.start_periodic(interval_micros)?;
        info!("Tick alarm armed every {} us", interval_micros);
        Ok(())
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Prescaler/reload pair for a 32-bit timer with a 16-bit prescaler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlarmTiming {
    /// Counter clock = timer clock / (prescaler + 1)
    pub prescaler: u16,
    /// Update event every `reload + 1` counter ticks
    pub reload: u32,
}

impl AlarmTiming {
    /// Smallest prescaler that fits `interval_micros` into the reload register
    ///
    /// `None` when the interval is zero, shorter than one timer tick, or too
    /// long even at the maximum prescaler.
    pub fn for_interval(timer_clock_hz: u32, interval_micros: u64) -> Option<Self> {
        let ticks = (interval_micros as u128 * timer_clock_hz as u128) / 1_000_000;
        if ticks == 0 {
            return None;
        }

        let span = u32::MAX as u128 + 1;
        let divider = ticks.div_ceil(span);
        if divider > u16::MAX as u128 + 1 {
            return None;
        }

        let reload = (ticks / divider).checked_sub(1)?;
        Some(Self {
            prescaler: (divider - 1) as u16,
            reload: reload as u32,
        })
    }

    /// Actual period produced, in microseconds
    pub fn interval_micros(&self, timer_clock_hz: u32) -> u64 {
        let ticks = (self.prescaler as u128 + 1) * (self.reload as u128 + 1);
        (ticks * 1_000_000 / timer_clock_hz as u128) as u64
    }
}
