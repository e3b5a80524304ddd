//! Wrapping per-period counter
//!
//! `2^D` states, one per period of the day, no terminal state. The counter
//! is seeded once from wall-clock time and afterwards only ever advances by
//! one per tick. A later re-sync of the clock does not move it; it keeps its
//! own synthetic position so the tick path never has to read the RTC.
//!
//! Seeding and ticking are the only two places the display is written.

use embedded_hal::digital::OutputPin;

use crate::display::{Display, DisplayFrame};
use crate::period;

/// Counter state machine bound to the display it drives
pub struct PeriodCounter<P, const D: usize> {
    state: u32,
    display: Display<P, D>,
}

impl<P: OutputPin, const D: usize> PeriodCounter<P, D> {
    /// Number of states, `2^D`
    pub const PERIOD_COUNT: u64 = period::period_count(D);

    /// Alarm interval that advances the counter once per period
    pub const MICROS_PER_PERIOD: u64 = period::micros_per_period(D);

    /// Seed from the time of day and render the initial state
    ///
    /// `state = floor(seconds_since_midnight * 2^D / 86400)`
    pub fn seed(seconds_since_midnight: u32, display: Display<P, D>) -> Result<Self, P::Error> {
        let mut counter = Self {
            state: period::state_at(seconds_since_midnight, D),
            display,
        };
        let frame = counter.display.render(counter.state)?;
        info!(
            "Counter seeded at {} s past midnight: state {} frame {}",
            seconds_since_midnight, counter.state, frame
        );
        Ok(counter)
    }

    pub fn state(&self) -> u32 {
        self.state
    }

    /// Advance one period, wrapping to 0 after `2^D - 1`, and render
    ///
    /// The state advances even if writing the lines fails.
    pub fn tick(&mut self) -> Result<DisplayFrame<D>, P::Error> {
        self.state = ((self.state as u64 + 1) % Self::PERIOD_COUNT) as u32;
        let frame = self.display.render(self.state)?;
        debug!("Tick: state {} frame {}", self.state, frame);
        Ok(frame)
    }

    pub fn display(&self) -> &Display<P, D> {
        &self.display
    }

    /// Give the display back
    pub fn release(self) -> Display<P, D> {
        self.display
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType;

    /// Counts writes, keeps the last level
    #[derive(Debug, Default)]
    struct CountingLine {
        high: bool,
        writes: usize,
    }

    impl ErrorType for CountingLine {
        type Error = Infallible;
    }

    impl OutputPin for CountingLine {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.high = false;
            self.writes += 1;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.high = true;
            self.writes += 1;
            Ok(())
        }
    }

    /// Line that refuses every write
    struct BrokenLine;

    impl ErrorType for BrokenLine {
        type Error = embedded_hal::digital::ErrorKind;
    }

    impl OutputPin for BrokenLine {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            Err(embedded_hal::digital::ErrorKind::Other)
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            Err(embedded_hal::digital::ErrorKind::Other)
        }
    }

    fn seeded<const D: usize>(secs: u32) -> PeriodCounter<CountingLine, D> {
        let lines = core::array::from_fn(|_| CountingLine::default());
        match PeriodCounter::seed(secs, Display::new(lines)) {
            Ok(counter) => counter,
            Err(e) => match e {},
        }
    }

    #[test]
    fn test_constants() {
        assert_eq!(PeriodCounter::<CountingLine, 8>::PERIOD_COUNT, 256);
        assert_eq!(PeriodCounter::<CountingLine, 8>::MICROS_PER_PERIOD, 337_500_000);
    }

    #[test]
    fn test_seed() {
        assert_eq!(seeded::<8>(0).state(), 0);
        assert_eq!(seeded::<8>(86_399).state(), 255);
        assert_eq!(seeded::<8>(43_200).state(), 128);
        // One period is 337.5 s at D = 8
        assert_eq!(seeded::<8>(337).state(), 0);
        assert_eq!(seeded::<8>(338).state(), 1);
    }

    #[test]
    fn test_seed_renders_once() {
        let counter = seeded::<8>(43_200);
        let lines = counter.display().lines();
        assert!(lines[0].high);
        assert!(lines[1..].iter().all(|l| !l.high));
        assert!(lines.iter().all(|l| l.writes == 1));
    }

    #[test]
    fn test_tick_increments_and_renders() {
        let mut counter = seeded::<8>(43_200);
        let frame = counter.tick().ok();
        assert_eq!(counter.state(), 129);
        assert_eq!(frame.map(|f| f.decode()), Some(129));
        let lines = counter.release().release();
        assert!(lines[7].high);
        assert!(lines.iter().all(|l| l.writes == 2));
    }

    #[test]
    fn test_wraparound() {
        let mut counter = seeded::<8>(86_399);
        assert_eq!(counter.state(), 255);
        let _ = counter.tick();
        assert_eq!(counter.state(), 0);
        assert!(counter.display().lines().iter().all(|l| !l.high));
    }

    #[test]
    fn test_wraparound_single_line() {
        let mut counter = seeded::<1>(0);
        let _ = counter.tick();
        assert_eq!(counter.state(), 1);
        let _ = counter.tick();
        assert_eq!(counter.state(), 0);
    }

    #[test]
    fn test_wraparound_widest() {
        let mut counter = seeded::<32>(86_399);
        counter.state = u32::MAX;
        let _ = counter.tick();
        assert_eq!(counter.state(), 0);
    }

    #[test]
    fn test_tick_advances_despite_line_error() {
        let mut counter = PeriodCounter {
            state: 3,
            display: Display::new([BrokenLine, BrokenLine, BrokenLine, BrokenLine]),
        };
        assert!(counter.tick().is_err());
        assert_eq!(counter.state(), 4);
    }

    #[test]
    fn test_seed_reports_line_error() {
        let result = PeriodCounter::seed(0, Display::new([BrokenLine, BrokenLine]));
        assert!(result.is_err());
    }
}
