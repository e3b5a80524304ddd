//! Binary display over digital output lines
//!
//! A [`DisplayFrame`] is the zero-padded, most-significant-bit-first binary
//! representation of a counter state: bit `i` drives output line `i`, so
//! line 0 carries the MSB. The [`Display`] owns its lines exclusively for
//! its whole lifetime.

use embedded_hal::digital::{OutputPin, PinState};
use heapless::String;

use crate::period::MAX_LINES;

/// `D` bits, most significant first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayFrame<const D: usize> {
    bits: [bool; D],
}

impl<const D: usize> DisplayFrame<D> {
    const WIDTH_OK: () = assert!(D >= 1 && D <= MAX_LINES, "frames hold 1..=32 bits");

    /// Encode the low `D` bits of `state`
    ///
    /// Widths outside `1..=32` are rejected at compile time.
    pub fn encode(state: u32) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::WIDTH_OK;
        let mut bits = [false; D];
        for (i, bit) in bits.iter_mut().enumerate() {
            let shift = D - 1 - i;
            *bit = (state as u64 >> shift) & 1 == 1;
        }
        Self { bits }
    }

    /// Reinterpret the frame as an integer
    pub fn decode(&self) -> u32 {
        self.bits
            .iter()
            .fold(0u64, |acc, &bit| (acc << 1) | bit as u64) as u32
    }

    pub fn bits(&self) -> &[bool; D] {
        &self.bits
    }

    /// The frame as a string of `'0'` and `'1'`
    pub fn to_bit_string(&self) -> String<MAX_LINES> {
        let mut s = String::new();
        for &bit in &self.bits {
            // D <= MAX_LINES, so this never overflows
            let _ = s.push(if bit { '1' } else { '0' });
        }
        s
    }
}

impl<const D: usize> core::fmt::Display for DisplayFrame<D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.to_bit_string())
    }
}

#[cfg(feature = "defmt")]
impl<const D: usize> defmt::Format for DisplayFrame<D> {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str}", self.to_bit_string().as_str())
    }
}

/// `D` output lines showing one binary frame
pub struct Display<P, const D: usize> {
    lines: [P; D],
}

impl<P: OutputPin, const D: usize> Display<P, D> {
    /// Bind `lines`; index 0 shows the most significant bit
    pub fn new(lines: [P; D]) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = DisplayFrame::<D>::WIDTH_OK;
        Self { lines }
    }

    pub const fn width(&self) -> usize {
        D
    }

    /// Write `state` to the lines, MSB on line 0
    ///
    /// `state` must be below `2^D`; the counter guarantees it.
    pub fn render(&mut self, state: u32) -> Result<DisplayFrame<D>, P::Error> {
        debug_assert!((state as u64) < crate::period::period_count(D));
        let frame = DisplayFrame::encode(state);
        for (line, &bit) in self.lines.iter_mut().zip(frame.bits()) {
            line.set_state(PinState::from(bit))?;
        }
        Ok(frame)
    }

    pub fn lines(&self) -> &[P; D] {
        &self.lines
    }

    /// Give the output lines back
    pub fn release(self) -> [P; D] {
        self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType;

    #[derive(Debug, Default)]
    struct MockLine {
        high: bool,
        writes: usize,
    }

    impl ErrorType for MockLine {
        type Error = Infallible;
    }

    impl OutputPin for MockLine {
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

    fn levels<const D: usize>(display: &Display<MockLine, D>) -> [bool; D] {
        let mut out = [false; D];
        for (o, line) in out.iter_mut().zip(display.lines()) {
            *o = line.high;
        }
        out
    }

    #[test]
    fn test_encode_msb_first() {
        let frame = DisplayFrame::<8>::encode(128);
        assert_eq!(frame.to_bit_string().as_str(), "10000000");
        assert_eq!(DisplayFrame::<8>::encode(129).to_string(), "10000001");
        assert_eq!(DisplayFrame::<4>::encode(5).to_string(), "0101");
        assert_eq!(DisplayFrame::<1>::encode(1).to_string(), "1");
    }

    #[test]
    fn test_decode() {
        assert_eq!(DisplayFrame::<8>::encode(0).decode(), 0);
        assert_eq!(DisplayFrame::<8>::encode(255).decode(), 255);
        assert_eq!(DisplayFrame::<32>::encode(u32::MAX).decode(), u32::MAX);
        assert_eq!(
            DisplayFrame::<32>::encode(0x8000_0001).to_string(),
            "10000000000000000000000000000001"
        );
    }

    #[test]
    fn test_frame_width_bounds() {
        // Both ends of 1..=32 pass the width check
        let () = DisplayFrame::<1>::WIDTH_OK;
        let () = DisplayFrame::<32>::WIDTH_OK;
        // Bits above the width are dropped
        assert_eq!(DisplayFrame::<1>::encode(0b10).decode(), 0);
        assert_eq!(DisplayFrame::<4>::encode(0x1F).to_string(), "1111");
        assert_eq!(DisplayFrame::<32>::encode(u32::MAX).to_bit_string().len(), 32);
    }

    #[test]
    fn test_render_drives_lines() {
        let mut display = Display::new(<[MockLine; 8]>::default());
        assert_eq!(display.width(), 8);

        let frame = display.render(128).ok();
        assert_eq!(frame.map(|f| f.decode()), Some(128));
        assert_eq!(
            levels(&display),
            [true, false, false, false, false, false, false, false]
        );

        let _ = display.render(0b0101_0011);
        assert_eq!(
            levels(&display),
            [false, true, false, true, false, false, true, true]
        );
        // Every line is written on every render
        assert!(display.release().iter().all(|line| line.writes == 2));
    }
}
