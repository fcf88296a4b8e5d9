//! Footprint-minimized decoder for ZIP archives and raw DEFLATE streams,
//! for environments where linking a full inflate implementation is too
//! costly: no heap allocation, no lookup tables beyond the small constant
//! arrays in [`tables`], and every archive byte pulled on demand through
//! a caller-supplied [`ByteSource`] rather than assumed resident in RAM.
//!
//! Two entry points cover the spec's two use cases:
//! - [`inflate_raw`] decodes a bare DEFLATE stream (RFC 1951), for callers
//!   that already know where the compressed bytes start and end.
//! - [`ZipArchive`] layers the ZIP container format (central directory
//!   lookup, STORE/DEFLATE dispatch, length and CRC-32 verification) on
//!   top of the same byte source.
//!
//! # Error model
//!
//! Every fallible operation returns a [`DecodeError`]; there is no panic
//! path for malformed input anywhere in this crate (`#[cfg(test)]` code
//! excepted). A [`ByteSource`] that reports out-of-bounds partway through
//! a multi-byte field surfaces as [`DecodeError::InputOutOfBounds`], the
//! same as a truncated archive.

#![cfg_attr(not(test), no_std)]

mod bit_reader;
mod byte_source;
mod crc32;
mod error;
mod huffman;
mod inflate;
mod output;
mod tables;
mod zip_directory;
mod zip_extract;

pub use byte_source::{ByteSource, RawCallback, RawReadFn};
pub use error::DecodeError;
pub use inflate::{inflate_raw, inflate_raw_lenient};
pub use zip_directory::{CompressionMethod, FileInfo, Selector};
pub use zip_extract::ZipArchive;
