//! Canonical-Huffman table construction and symbol decoding.
//!
//! No canonical code value is ever materialized. [`HuffmanTable`] stores
//! only a per-length symbol count and the symbols themselves in
//! length-then-symbol order; [`decode_symbol`] reconstructs the code bit
//! by bit as it walks the bitstream (RFC 1951's canonical-code recipe
//! run in reverse).

use crate::bit_reader::BitReader;
use crate::byte_source::ByteSource;
use crate::error::DecodeError;

/// Canonical-Huffman decode table for an alphabet of at most `N` symbols.
///
/// `counts[L]` is the number of symbols whose code length is exactly `L`
/// (`counts[0]` is unused); `symbols[..used]` lists symbol ids in
/// ascending (length, symbol id) order.
pub struct HuffmanTable<const N: usize> {
    counts: [u16; 16],
    symbols: [u16; N],
    used: usize,
}

impl<const N: usize> HuffmanTable<N> {
    /// Builds a table from a vector of code lengths (`0..=15`, `0` meaning
    /// "symbol unused"). `lengths.len()` must not exceed `N`.
    pub fn build(lengths: &[u8]) -> Result<Self, DecodeError> {
        debug_assert!(lengths.len() <= N);
        let mut counts = [0u16; 16];
        for &len in lengths {
            if len > 15 {
                return Err(DecodeError::CodeLengthTooLong);
            }
            counts[len as usize] += 1;
        }

        let mut symbols = [0u16; N];
        let mut used = 0usize;
        for target_len in 1..=15u8 {
            for (i, &len) in lengths.iter().enumerate() {
                if len == target_len {
                    symbols[used] = i as u16;
                    used += 1;
                }
            }
        }

        Ok(Self { counts, symbols, used })
    }

    fn symbol_at(&self, index: usize) -> Option<u16> {
        if index < self.used {
            Some(self.symbols[index])
        } else {
            None
        }
    }
}

/// Decodes one symbol from `bits` using `table`, per the canonical-Huffman
/// walk: one bit per iteration, at most 15 iterations.
pub fn decode_symbol<const N: usize, R: ByteSource>(
    bits: &mut BitReader<'_, R>,
    table: &HuffmanTable<N>,
) -> Result<u16, DecodeError> {
    let mut code: i32 = 0;
    let mut code_start: i32 = 0;
    let mut symbol_index: usize = 0;

    for length in 1..=15usize {
        code = (code << 1) | bits.read_bits(1)? as i32;
        let count = table.counts[length] as i32;
        if code - code_start < count {
            let index = symbol_index + (code - code_start) as usize;
            return table.symbol_at(index).ok_or(DecodeError::HuffmanEscape);
        }
        code_start = (code_start + count) << 1;
        symbol_index += count as usize;
    }
    Err(DecodeError::HuffmanEscape)
}
