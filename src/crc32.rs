//! IEEE 802.3 CRC-32, computed bit-serially.
//!
//! No 256-entry lookup table: the spec's footprint target trades a few
//! cycles per byte for zero static memory here, the same trade the
//! teacher crate makes for its Huffman decode tree rather than a direct
//! jump table.

const POLY: u32 = 0xEDB8_8320;

/// Computes the CRC-32 of `data`, matching the ZIP central directory's
/// recorded value (init `0xFFFFFFFF`, final XOR `0xFFFFFFFF`).
pub fn crc32(data: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;
    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            let mask = (crc & 1).wrapping_neg();
            crc = (crc >> 1) ^ (POLY & mask);
        }
    }
    !crc
}
