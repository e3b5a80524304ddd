//! Periodic alarm abstraction

/// A hardware alarm that fires an interrupt at a fixed interval
///
/// The interrupt binding itself is board specific (an RTIC hardware task, a
/// vector table entry, ...). This trait only covers programming the period.
pub trait PeriodicAlarm {
    /// Configuration error type
    type Error: core::fmt::Debug;

    /// Start (or restart) the alarm so it fires every `interval_micros`
    fn start_periodic(&mut self, interval_micros: u64) -> Result<(), Self::Error>;

    /// Stop the alarm; no further interrupts are raised
    fn stop(&mut self);
}
