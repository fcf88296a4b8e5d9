//! The ZIP end-of-central-directory scan and central-directory iteration
//! (spec component H): locates the archive's directory, walks it by
//! index or exact name, and resolves the matching local file header.

use crate::byte_source::{read_u16_le, read_u32_le, read_u8, ByteSource};
use crate::error::DecodeError;

const EOCD_SIGNATURE: u32 = 0x0605_4b50;
const CENTRAL_DIR_SIGNATURE: u32 = 0x0201_4b50;
const LOCAL_HEADER_SIGNATURE: u32 = 0x0403_4b50;
const DATA_DESCRIPTOR_SIGNATURE: u32 = 0x0807_4b50;

/// Maximum bytes of filename this decoder will retain (spec §3: "at most
/// 255 bytes, null-terminated").
const MAX_NAME_LEN: usize = 255;

/// Compression method named in a local/central file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Store,
    Deflate,
}

impl TryFrom<u16> for CompressionMethod {
    type Error = DecodeError;

    fn try_from(value: u16) -> Result<Self, DecodeError> {
        match value {
            0 => Ok(CompressionMethod::Store),
            8 => Ok(CompressionMethod::Deflate),
            _ => Err(DecodeError::UnsupportedCompressionMethod),
        }
    }
}

/// Selects which central directory entry `locate` should resolve.
pub enum Selector<'a> {
    /// The `k`-th entry encountered while iterating (0-based).
    Index(u32),
    /// The entry whose filename matches exactly, byte for byte.
    Name(&'a [u8]),
}

/// Metadata for one archive entry, populated from its local file header.
///
/// Mirrors the spec's scratch-overlaid file-info record: valid only until
/// the next call that touches the same [`crate::ZipArchive`].
#[derive(Debug, Clone)]
pub struct FileInfo {
    pub method: CompressionMethod,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    /// Absolute offset of the first byte of compressed (or stored) data.
    pub data_offset: u32,
    /// General-purpose flag bit 3: sizes/CRC may be in a trailing descriptor.
    pub have_data_descriptor: bool,
    name_buf: [u8; MAX_NAME_LEN + 1],
    name_len: u8,
}

impl FileInfo {
    pub fn name(&self) -> &[u8] {
        &self.name_buf[..self.name_len as usize]
    }
}

/// Scans backward from `archive_length - 22` for the EOCD record, within
/// the 65557-byte window a maximum-length comment allows, and returns the
/// central directory's starting offset.
pub fn find_eocd(src: &mut impl ByteSource, archive_length: u32) -> Result<u32, DecodeError> {
    if archive_length < 22 {
        return Err(DecodeError::EocdNotFound);
    }
    let earliest = archive_length.saturating_sub(22 + 65535);
    let latest = archive_length - 22;

    for offset in (earliest..=latest).rev() {
        if read_u32_le(src, offset)? != EOCD_SIGNATURE {
            continue;
        }
        let comment_len = read_u16_le(src, offset + 20)? as u32;
        if offset + 22 + comment_len != archive_length {
            continue;
        }
        let central_dir_offset = read_u32_le(src, offset + 16)?;
        log::trace!("EOCD located at offset {offset}, central directory at {central_dir_offset}");
        return Ok(central_dir_offset);
    }
    Err(DecodeError::EocdNotFound)
}

fn filename_matches(
    src: &mut impl ByteSource,
    name_offset: u32,
    name_len: u32,
    expected: &[u8],
) -> Result<bool, DecodeError> {
    if name_len as usize != expected.len() {
        return Ok(false);
    }
    for (i, &want) in expected.iter().enumerate() {
        if read_u8(src, name_offset + i as u32)? != want {
            return Ok(false);
        }
    }
    Ok(true)
}

fn read_local_header(src: &mut impl ByteSource, local_offset: u32) -> Result<FileInfo, DecodeError> {
    if read_u32_le(src, local_offset)? != LOCAL_HEADER_SIGNATURE {
        return Err(DecodeError::LocalHeaderSignatureMismatch);
    }

    let gp_flags = read_u16_le(src, local_offset + 6)?;
    let have_data_descriptor = gp_flags & 0x0008 != 0;
    let method = CompressionMethod::try_from(read_u16_le(src, local_offset + 8)?)?;
    let crc32 = read_u32_le(src, local_offset + 14)?;
    let compressed_size = read_u32_le(src, local_offset + 18)?;
    let uncompressed_size = read_u32_le(src, local_offset + 22)?;
    let filename_len = read_u16_le(src, local_offset + 26)? as u32;
    let extra_len = read_u16_le(src, local_offset + 28)? as u32;
    let data_offset = local_offset + 30 + filename_len + extra_len;

    let mut name_buf = [0u8; MAX_NAME_LEN + 1];
    let copy_len = filename_len.min(MAX_NAME_LEN as u32);
    for i in 0..copy_len {
        name_buf[i as usize] = read_u8(src, local_offset + 30 + i)?;
    }
    name_buf[copy_len as usize] = 0;

    Ok(FileInfo {
        method,
        crc32,
        compressed_size,
        uncompressed_size,
        data_offset,
        have_data_descriptor,
        name_buf,
        name_len: copy_len as u8,
    })
}

/// Iterates the central directory starting at `central_dir_offset`,
/// matching entries against `selector`, and resolves the matched entry's
/// local file header.
pub fn locate(
    src: &mut impl ByteSource,
    central_dir_offset: u32,
    archive_length: u32,
    selector: Selector<'_>,
) -> Result<FileInfo, DecodeError> {
    let mut offset = central_dir_offset;
    let mut remaining = match selector {
        Selector::Index(i) => i,
        Selector::Name(_) => 0,
    };

    loop {
        if offset >= archive_length {
            break;
        }
        if read_u32_le(src, offset)? != CENTRAL_DIR_SIGNATURE {
            break;
        }

        let filename_len = read_u16_le(src, offset + 28)? as u32;
        let extra_len = read_u16_le(src, offset + 30)? as u32;
        let comment_len = read_u16_le(src, offset + 32)? as u32;
        let record_size = 46 + filename_len + extra_len + comment_len;

        let matched = match selector {
            Selector::Name(name) => filename_matches(src, offset + 46, filename_len, name)?,
            Selector::Index(_) => {
                let is_match = remaining == 0;
                if !is_match {
                    remaining -= 1;
                }
                is_match
            }
        };

        if matched {
            let local_offset = read_u32_le(src, offset + 42)?;
            return read_local_header(src, local_offset);
        }

        offset = offset.checked_add(record_size).ok_or(DecodeError::EntryNotFound)?;
    }
    Err(DecodeError::EntryNotFound)
}

pub(crate) const fn data_descriptor_signature() -> u32 {
    DATA_DESCRIPTOR_SIGNATURE
}
