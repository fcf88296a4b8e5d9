//! The DEFLATE block decoder and the raw-inflate driver (spec components
//! E and F): stored/fixed/dynamic block bodies, the shared back-reference
//! payload loop, and the BFINAL loop that drives them.

use crate::bit_reader::BitReader;
use crate::byte_source::ByteSource;
use crate::error::DecodeError;
use crate::huffman::{decode_symbol, HuffmanTable};
use crate::output::OutputWindow;
use crate::tables::{CLEN_ORDER, DIST_EXTRA, LEN_BASE, LEN_EXTRA};
use crate::tables::DIST_BASE;

/// Maximum literal/length alphabet size: 286 defined symbols plus the two
/// reserved-but-representable HLIT slots (257 + 31 max HLIT value = 288).
const MAX_LITLEN_SYMBOLS: usize = 288;
/// Maximum distance alphabet size (HDIST maxes out at 32).
const MAX_DIST_SYMBOLS: usize = 32;
/// Code-length alphabet size (always exactly 19 symbols).
const MAX_CLEN_SYMBOLS: usize = 19;
/// HLIT + HDIST upper bound, sizing the transient decoded-lengths buffer.
const MAX_CODE_LENGTHS: usize = MAX_LITLEN_SYMBOLS + MAX_DIST_SYMBOLS;

fn decode_block_header<R: ByteSource>(bits: &mut BitReader<'_, R>) -> Result<(bool, u8), DecodeError> {
    let raw = bits.read_bits(3)?;
    Ok((raw & 1 != 0, (raw >> 1) as u8))
}

fn stored_block<R: ByteSource>(
    bits: &mut BitReader<'_, R>,
    out: &mut OutputWindow<'_>,
) -> Result<(), DecodeError> {
    bits.reset();
    let len_lo = bits.read_aligned_byte()? as u16;
    let len_hi = bits.read_aligned_byte()? as u16;
    let len = len_lo | (len_hi << 8);
    let _nlen = (bits.read_aligned_byte()?, bits.read_aligned_byte()?);
    for _ in 0..len {
        let byte = bits.read_aligned_byte()?;
        out.push(byte)?;
    }
    Ok(())
}

/// Hand-rolled RFC 1951 §3.2.6 fixed literal/length decode: read 7 bits
/// reversed, extending by 1 or 2 more bits depending on the initial range.
/// A micro-optimization for footprint over building a 288-symbol table
/// for a code that never changes.
fn decode_fixed_litlen<R: ByteSource>(bits: &mut BitReader<'_, R>) -> Result<u16, DecodeError> {
    let v7 = bits.read_bits_reversed(7)?;
    if v7 <= 23 {
        return Ok(256 + v7 as u16);
    }
    let v8 = (v7 << 1) | bits.read_bits_reversed(1)?;
    if v8 <= 191 {
        return Ok((v8 - 48) as u16);
    }
    if v8 <= 199 {
        return Ok(280 + (v8 - 192) as u16);
    }
    let v9 = (v8 << 1) | bits.read_bits_reversed(1)?;
    Ok(144 + (v9 - 400) as u16)
}

/// Fixed distance code: a flat 5-bit reversed value, used directly.
fn decode_fixed_dist<R: ByteSource>(bits: &mut BitReader<'_, R>) -> Result<u16, DecodeError> {
    Ok(bits.read_bits_reversed(5)? as u16)
}

fn fixed_block<R: ByteSource>(
    bits: &mut BitReader<'_, R>,
    out: &mut OutputWindow<'_>,
) -> Result<(), DecodeError> {
    run_payload(bits, out, decode_fixed_litlen, decode_fixed_dist)
}

fn dynamic_block<R: ByteSource>(
    bits: &mut BitReader<'_, R>,
    out: &mut OutputWindow<'_>,
) -> Result<(), DecodeError> {
    let hlit = bits.read_bits(5)? as usize + 257;
    let hdist = bits.read_bits(5)? as usize + 1;
    let hclen = bits.read_bits(4)? as usize + 4;

    let mut clen_lengths = [0u8; MAX_CLEN_SYMBOLS];
    for i in 0..hclen {
        clen_lengths[CLEN_ORDER[i]] = bits.read_bits(3)? as u8;
    }
    let clen_table: HuffmanTable<MAX_CLEN_SYMBOLS> = HuffmanTable::build(&clen_lengths)?;

    let total = hlit + hdist;
    let mut code_lengths = [0u8; MAX_CODE_LENGTHS];
    let mut i = 0usize;
    while i < total {
        let symbol = decode_symbol(bits, &clen_table)?;
        match symbol {
            0..=15 => {
                code_lengths[i] = symbol as u8;
                i += 1;
            }
            16 => {
                if i == 0 {
                    return Err(DecodeError::NoPreviousCodeLength);
                }
                let repeat = 3 + bits.read_bits(2)? as usize;
                if i + repeat > total {
                    return Err(DecodeError::CodeLengthOverrun);
                }
                let prev = code_lengths[i - 1];
                for _ in 0..repeat {
                    code_lengths[i] = prev;
                    i += 1;
                }
            }
            17 => {
                let repeat = 3 + bits.read_bits(3)? as usize;
                if i + repeat > total {
                    return Err(DecodeError::CodeLengthOverrun);
                }
                for _ in 0..repeat {
                    code_lengths[i] = 0;
                    i += 1;
                }
            }
            18 => {
                let repeat = 11 + bits.read_bits(7)? as usize;
                if i + repeat > total {
                    return Err(DecodeError::CodeLengthOverrun);
                }
                for _ in 0..repeat {
                    code_lengths[i] = 0;
                    i += 1;
                }
            }
            _ => return Err(DecodeError::HuffmanEscape),
        }
    }

    let litlen_table: HuffmanTable<MAX_LITLEN_SYMBOLS> = HuffmanTable::build(&code_lengths[..hlit])?;
    let dist_table: HuffmanTable<MAX_DIST_SYMBOLS> = HuffmanTable::build(&code_lengths[hlit..total])?;

    log::trace!("dynamic huffman block: hlit={hlit} hdist={hdist} hclen={hclen}");

    run_payload(
        bits,
        out,
        |b| decode_symbol(b, &litlen_table),
        |b| decode_symbol(b, &dist_table),
    )
}

/// The back-reference payload loop shared by fixed and dynamic blocks:
/// decode a literal/length symbol, act on it, repeat until end-of-block.
fn run_payload<R, FL, FD>(
    bits: &mut BitReader<'_, R>,
    out: &mut OutputWindow<'_>,
    mut decode_litlen: FL,
    mut decode_dist: FD,
) -> Result<(), DecodeError>
where
    R: ByteSource,
    FL: FnMut(&mut BitReader<'_, R>) -> Result<u16, DecodeError>,
    FD: FnMut(&mut BitReader<'_, R>) -> Result<u16, DecodeError>,
{
    loop {
        let symbol = decode_litlen(bits)?;
        if symbol < 256 {
            out.push(symbol as u8)?;
        } else if symbol == 256 {
            return Ok(());
        } else if symbol <= 285 {
            let idx = (symbol - 257) as usize;
            let len = LEN_BASE[idx] as usize + 3 + bits.read_bits(LEN_EXTRA[idx] as u32)? as usize;

            let dist_symbol = decode_dist(bits)?;
            if dist_symbol as usize >= DIST_BASE.len() {
                return Err(DecodeError::InvalidDistanceSymbol);
            }
            let didx = dist_symbol as usize;
            let dist = DIST_BASE[didx] as usize + bits.read_bits(DIST_EXTRA[didx] as u32)? as usize;

            out.copy_back(dist, len)?;
        } else {
            return Err(DecodeError::InvalidLiteralSymbol);
        }
    }
}

fn decode_one_block<R: ByteSource>(
    bits: &mut BitReader<'_, R>,
    out: &mut OutputWindow<'_>,
) -> Result<bool, DecodeError> {
    let (bfinal, btype) = decode_block_header(bits)?;
    match btype {
        0 => stored_block(bits, out)?,
        1 => fixed_block(bits, out)?,
        2 => dynamic_block(bits, out)?,
        _ => return Err(DecodeError::InvalidBlockType),
    }
    Ok(bfinal)
}

/// Raw DEFLATE entry point (spec component F): decodes blocks starting at
/// `start_offset` until BFINAL, writing into `out`. Returns the number of
/// bytes produced.
pub fn inflate_raw<R: ByteSource>(
    src: &mut R,
    start_offset: u32,
    limit: u32,
    out: &mut [u8],
) -> Result<usize, DecodeError> {
    let mut bits = BitReader::new(src, start_offset, limit);
    let mut window = OutputWindow::new(out);
    loop {
        if decode_one_block(&mut bits, &mut window)? {
            break;
        }
    }
    Ok(window.len())
}

/// Like [`inflate_raw`], but returns whatever partial output was produced
/// instead of propagating the first error, for fuzz/robustness harnesses
/// that want to confirm the decoder terminates and never touches memory
/// outside `out`, without treating a malformed stream as fatal to the run.
pub fn inflate_raw_lenient<R: ByteSource>(
    src: &mut R,
    start_offset: u32,
    limit: u32,
    out: &mut [u8],
) -> (usize, Option<DecodeError>) {
    let mut bits = BitReader::new(src, start_offset, limit);
    let mut window = OutputWindow::new(out);
    loop {
        match decode_one_block(&mut bits, &mut window) {
            Ok(true) => return (window.len(), None),
            Ok(false) => continue,
            Err(err) => return (window.len(), Some(err)),
        }
    }
}
