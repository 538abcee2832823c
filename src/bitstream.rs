//! LSB-first variable width code reader.

use crate::common::DecodeError;

/// Widest code a GIF stream may use.
pub const MAX_CODE_WIDTH: u8 = 12;

/// Pulls fixed-width codes out of an already flattened byte stream.
///
/// Codes are packed least-significant-bit first and straddle byte boundaries freely; sub-block
/// framing has to be stripped before bytes reach the reader (see [`crate::iterators::SubBlocks`]).
pub struct BitReader<I> {
    bytes: I,
    /// Pending bits, next code in the low end.
    acc: u32,
    /// Number of valid bits in `acc`.
    bits: u8,
}

impl<I: Iterator<Item = u8>> BitReader<I> {
    pub fn new(bytes: I) -> Self {
        Self {
            bytes,
            acc: 0,
            bits: 0,
        }
    }

    /// Read the next `width`-bit code.
    ///
    /// Running out of input before `width` bits are available is a
    /// [`DecodeError::BitstreamUnderflow`], never a silent zero.
    pub fn read_code(&mut self, width: u8) -> Result<u16, DecodeError> {
        debug_assert!((1..=MAX_CODE_WIDTH).contains(&width));
        while self.bits < width {
            let byte = self.bytes.next().ok_or(DecodeError::BitstreamUnderflow)?;
            self.acc |= u32::from(byte) << self.bits;
            self.bits += 8;
        }
        let code = (self.acc & ((1 << width) - 1)) as u16;
        self.acc >>= width;
        self.bits -= width;
        Ok(code)
    }

    /// Bits buffered but not yet handed out.
    pub fn buffered_bits(&self) -> u8 {
        self.bits
    }
}
