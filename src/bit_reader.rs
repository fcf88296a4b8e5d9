//! LSB-first bit extraction layered over a [`ByteSource`].
//!
//! Every compressed bit in a DEFLATE stream is pulled through here. The
//! accumulator holds at most 32 bits; a refill only ever tops it up to
//! cover the next request, never further, so [`BitReader::reset`] can
//! drop a partial byte without needing to rewind the byte cursor.

use crate::byte_source::ByteSource;
use crate::error::DecodeError;

/// Reads DEFLATE bits out of a [`ByteSource`], LSB-first.
pub struct BitReader<'a, R: ByteSource> {
    src: &'a mut R,
    /// Absolute offset of the next byte to pull from `src`.
    cursor: u32,
    /// One past the last valid input offset; reads at or beyond this are OOB.
    limit: u32,
    accumulator: u32,
    valid: u32,
}

impl<'a, R: ByteSource> BitReader<'a, R> {
    pub fn new(src: &'a mut R, start_offset: u32, limit: u32) -> Self {
        Self { src, cursor: start_offset, limit, accumulator: 0, valid: 0 }
    }

    /// Pulls one byte through the source, latching [`DecodeError::InputOutOfBounds`]
    /// on exhaustion or an out-of-range cursor.
    fn read_byte(&mut self) -> Result<u8, DecodeError> {
        if self.cursor >= self.limit {
            return Err(DecodeError::InputOutOfBounds);
        }
        let byte = self.src.read_at(self.cursor).ok_or(DecodeError::InputOutOfBounds)?;
        self.cursor += 1;
        Ok(byte)
    }

    fn refill(&mut self, want: u32) -> Result<(), DecodeError> {
        while self.valid < want {
            let byte = self.read_byte()?;
            self.accumulator |= (byte as u32) << self.valid;
            self.valid += 8;
        }
        Ok(())
    }

    /// Reads `n` bits (`0..=20`), LSB-first, and advances past them. `n == 0`
    /// is allowed so length/distance "extra bits" counts (which can be
    /// zero) don't need special-casing at call sites.
    pub fn read_bits(&mut self, n: u32) -> Result<u32, DecodeError> {
        debug_assert!(n <= 20);
        self.refill(n)?;
        let mask = (1u32 << n) - 1;
        let bits = self.accumulator & mask;
        self.accumulator >>= n;
        self.valid -= n;
        Ok(bits)
    }

    /// Reads `n` bits and returns them MSB-first (the bit-reversal of
    /// [`Self::read_bits`]); only the fixed-Huffman fast path needs this.
    pub fn read_bits_reversed(&mut self, n: u32) -> Result<u32, DecodeError> {
        let bits = self.read_bits(n)?;
        let mut out = 0u32;
        for i in 0..n {
            out = (out << 1) | ((bits >> i) & 1);
        }
        Ok(out)
    }

    /// Drops any partial byte buffered in the accumulator, realigning to
    /// the next whole byte boundary. Used at the start of a stored block.
    pub fn reset(&mut self) {
        self.accumulator = 0;
        self.valid = 0;
    }

    /// Reads one raw byte directly from the input at the current byte
    /// cursor, bypassing the bit accumulator; only valid right after
    /// [`Self::reset`], i.e. at a byte boundary.
    pub fn read_aligned_byte(&mut self) -> Result<u8, DecodeError> {
        debug_assert_eq!(self.valid, 0);
        self.read_byte()
    }
}
