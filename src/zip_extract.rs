//! Entry extraction (spec component I): dispatches STORE/DEFLATE, then
//! verifies the produced bytes against the recorded length and CRC-32,
//! falling back to a trailing data descriptor when the local header's own
//! fields were left unset (general-purpose flag bit 3).

use crate::byte_source::{read_u32_le, read_u8, ByteSource};
use crate::crc32::crc32;
use crate::error::DecodeError;
use crate::inflate::inflate_raw;
use crate::zip_directory::{data_descriptor_signature, find_eocd, locate, CompressionMethod, FileInfo, Selector};

/// A ZIP archive opened over a [`ByteSource`].
///
/// Holds no decoded state between calls beyond the central directory's
/// location: every [`FileInfo`] returned by [`Self::locate`] is
/// self-contained and can be extracted independently.
pub struct ZipArchive<R: ByteSource> {
    reader: R,
    archive_length: u32,
    central_dir_offset: u32,
}

impl<R: ByteSource> ZipArchive<R> {
    /// Scans for the End Of Central Directory record and opens the archive.
    pub fn open(mut reader: R, archive_length: u32) -> Result<Self, DecodeError> {
        let central_dir_offset = find_eocd(&mut reader, archive_length)?;
        Ok(Self { reader, archive_length, central_dir_offset })
    }

    /// Resolves a central directory entry by name or index.
    pub fn locate(&mut self, selector: Selector<'_>) -> Result<FileInfo, DecodeError> {
        locate(&mut self.reader, self.central_dir_offset, self.archive_length, selector)
    }

    /// Extracts `info` into `out`, which must be at least
    /// `info.uncompressed_size` bytes. Verifies the decoded length and
    /// CRC-32 before returning.
    pub fn extract(&mut self, info: &FileInfo, out: &mut [u8]) -> Result<(), DecodeError> {
        if (info.uncompressed_size as usize) > out.len() {
            return Err(DecodeError::OutputOverflow);
        }

        let produced = match info.method {
            CompressionMethod::Store => {
                self.copy_stored(info, out)?;
                info.uncompressed_size as usize
            }
            CompressionMethod::Deflate => {
                inflate_raw(&mut self.reader, info.data_offset, self.archive_length, out)?
            }
        };

        if produced as u32 != info.uncompressed_size {
            return Err(DecodeError::LengthMismatch);
        }

        let expected_crc = self.expected_crc(info)?;
        let actual_crc = crc32(&out[..produced]);
        if actual_crc != expected_crc {
            return Err(DecodeError::Crc32Mismatch);
        }

        log::trace!("extracted {produced} bytes, crc32 {actual_crc:#010x}");
        Ok(())
    }

    fn copy_stored(&mut self, info: &FileInfo, out: &mut [u8]) -> Result<(), DecodeError> {
        for i in 0..info.uncompressed_size {
            out[i as usize] = read_u8(&mut self.reader, info.data_offset + i)?;
        }
        Ok(())
    }

    /// Returns the CRC-32 the entry should match: straight from the local
    /// header, unless bit 3 of the general-purpose flags deferred it to a
    /// trailing data descriptor, which may or may not carry the optional
    /// `PK\x07\x08` marker before its three fields.
    fn expected_crc(&mut self, info: &FileInfo) -> Result<u32, DecodeError> {
        if !info.have_data_descriptor {
            return Ok(info.crc32);
        }
        let descriptor_offset = info.data_offset + info.compressed_size;
        let first_word = read_u32_le(&mut self.reader, descriptor_offset)?;
        if first_word == data_descriptor_signature() {
            read_u32_le(&mut self.reader, descriptor_offset + 4)
        } else {
            Ok(first_word)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_u32_le(buf: &mut Vec<u8>, v: u32) {
        buf.extend_from_slice(&v.to_le_bytes());
    }

    fn push_u16_le(buf: &mut Vec<u8>, v: u16) {
        buf.extend_from_slice(&v.to_le_bytes());
    }

    fn build_archive(
        name: &[u8],
        method: u16,
        stored_bytes: &[u8],
        uncompressed: &[u8],
        gp_flags: u16,
        crc_in_header: u32,
        trailing_descriptor: Option<(bool, u32)>,
    ) -> Vec<u8> {
        let mut buf = Vec::new();
        let local_offset = 0u32;

        buf.extend_from_slice(&0x0403_4b50u32.to_le_bytes());
        push_u16_le(&mut buf, 20);
        push_u16_le(&mut buf, gp_flags);
        push_u16_le(&mut buf, method);
        push_u16_le(&mut buf, 0);
        push_u16_le(&mut buf, 0);
        push_u32_le(&mut buf, crc_in_header);
        push_u32_le(&mut buf, stored_bytes.len() as u32);
        push_u32_le(&mut buf, uncompressed.len() as u32);
        push_u16_le(&mut buf, name.len() as u16);
        push_u16_le(&mut buf, 0);
        buf.extend_from_slice(name);
        buf.extend_from_slice(stored_bytes);

        if let Some((with_marker, crc)) = trailing_descriptor {
            if with_marker {
                push_u32_le(&mut buf, 0x0807_4b50);
            }
            push_u32_le(&mut buf, crc);
            push_u32_le(&mut buf, stored_bytes.len() as u32);
            push_u32_le(&mut buf, uncompressed.len() as u32);
        }

        let central_dir_offset = buf.len() as u32;
        buf.extend_from_slice(&0x0201_4b50u32.to_le_bytes());
        push_u16_le(&mut buf, 20);
        push_u16_le(&mut buf, 20);
        push_u16_le(&mut buf, gp_flags);
        push_u16_le(&mut buf, method);
        push_u16_le(&mut buf, 0);
        push_u16_le(&mut buf, 0);
        push_u32_le(&mut buf, crc_in_header);
        push_u32_le(&mut buf, stored_bytes.len() as u32);
        push_u32_le(&mut buf, uncompressed.len() as u32);
        push_u16_le(&mut buf, name.len() as u16);
        push_u16_le(&mut buf, 0);
        push_u16_le(&mut buf, 0);
        push_u16_le(&mut buf, 0);
        push_u16_le(&mut buf, 0);
        push_u32_le(&mut buf, 0);
        push_u32_le(&mut buf, local_offset);
        buf.extend_from_slice(name);

        let central_dir_size = buf.len() as u32 - central_dir_offset;
        buf.extend_from_slice(&0x0605_4b50u32.to_le_bytes());
        push_u16_le(&mut buf, 0);
        push_u16_le(&mut buf, 0);
        push_u16_le(&mut buf, 1);
        push_u16_le(&mut buf, 1);
        push_u32_le(&mut buf, central_dir_size);
        push_u32_le(&mut buf, central_dir_offset);
        push_u16_le(&mut buf, 0);

        buf
    }

    #[test]
    fn extracts_stored_entry() {
        let payload = b"hello world";
        let crc = crc32(payload);
        let archive = build_archive(b"a.txt", 0, payload, payload, 0, crc, None);
        let mut zip = ZipArchive::open(archive.as_slice(), archive.len() as u32).unwrap();
        let info = zip.locate(Selector::Name(b"a.txt")).unwrap();
        let mut out = [0u8; 11];
        zip.extract(&info, &mut out).unwrap();
        assert_eq!(&out, payload);
    }

    #[test]
    fn stored_entry_crc_mismatch_is_rejected() {
        let payload = b"hello world";
        let archive = build_archive(b"a.txt", 0, payload, payload, 0, 0xdead_beef, None);
        let mut zip = ZipArchive::open(archive.as_slice(), archive.len() as u32).unwrap();
        let info = zip.locate(Selector::Name(b"a.txt")).unwrap();
        let mut out = [0u8; 11];
        assert_eq!(zip.extract(&info, &mut out), Err(DecodeError::Crc32Mismatch));
    }

    #[test]
    fn data_descriptor_without_marker_supplies_crc() {
        let payload = b"hi";
        let crc = crc32(payload);
        // gp flag bit 3 set; header crc left at 0; descriptor has no PK\x07\x08 marker.
        let archive = build_archive(b"a.txt", 0, payload, payload, 0x0008, 0, Some((false, crc)));
        let mut zip = ZipArchive::open(archive.as_slice(), archive.len() as u32).unwrap();
        let info = zip.locate(Selector::Name(b"a.txt")).unwrap();
        let mut out = [0u8; 2];
        zip.extract(&info, &mut out).unwrap();
        assert_eq!(&out, payload);
    }

    #[test]
    fn data_descriptor_with_marker_supplies_crc() {
        let payload = b"hi";
        let crc = crc32(payload);
        let archive = build_archive(b"a.txt", 0, payload, payload, 0x0008, 0, Some((true, crc)));
        let mut zip = ZipArchive::open(archive.as_slice(), archive.len() as u32).unwrap();
        let info = zip.locate(Selector::Name(b"a.txt")).unwrap();
        let mut out = [0u8; 2];
        zip.extract(&info, &mut out).unwrap();
        assert_eq!(&out, payload);
    }

    #[test]
    fn output_buffer_too_small_is_an_overflow_error() {
        let payload = b"hello world";
        let crc = crc32(payload);
        let archive = build_archive(b"a.txt", 0, payload, payload, 0, crc, None);
        let mut zip = ZipArchive::open(archive.as_slice(), archive.len() as u32).unwrap();
        let info = zip.locate(Selector::Name(b"a.txt")).unwrap();
        let mut out = [0u8; 4];
        assert_eq!(zip.extract(&info, &mut out), Err(DecodeError::OutputOverflow));
    }
}
