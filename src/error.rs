/// Every way a decode can fail.
///
/// A [`DecodeError`] is latched the first time it occurs and returned from
/// every subsequent call until the owning decoder is reconstructed; see
/// the module-level docs in `lib.rs` for the sticky-error model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// A DEFLATE block header named a BTYPE of 3 (reserved).
    InvalidBlockType,
    /// A code-length value decoded to more than 15 bits.
    CodeLengthTooLong,
    /// A code-length repeat (16/17/18) would write past HLIT+HDIST entries.
    CodeLengthOverrun,
    /// Code-length symbol 16 appeared before any literal code length had
    /// been emitted.
    NoPreviousCodeLength,
    /// A Huffman decode walked 15 bits without landing in a valid range.
    HuffmanEscape,
    /// A decoded literal/length symbol fell outside 0..=285.
    InvalidLiteralSymbol,
    /// A decoded distance symbol fell outside 0..=29.
    InvalidDistanceSymbol,
    /// A back-reference distance exceeds the bytes produced so far.
    DistanceTooFar,
    /// A write would exceed the bounds of the caller-supplied output.
    OutputOverflow,
    /// The byte source returned "out of bounds" for an offset needed to
    /// make progress.
    InputOutOfBounds,
    /// No End Of Central Directory record was found within the trailing
    /// 65557 bytes of the archive.
    EocdNotFound,
    /// A central directory record did not start with the expected
    /// signature.
    CentralDirectorySignatureMismatch,
    /// A local file header did not start with the expected signature.
    LocalHeaderSignatureMismatch,
    /// `locate_file` walked the whole central directory without a match.
    EntryNotFound,
    /// The entry uses a compression method other than Store or Deflate.
    UnsupportedCompressionMethod,
    /// Decoded output length did not match the recorded uncompressed size.
    LengthMismatch,
    /// Decoded output failed the recorded CRC-32 check.
    Crc32Mismatch,
}

impl core::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            DecodeError::InvalidBlockType => "invalid DEFLATE block type",
            DecodeError::CodeLengthTooLong => "Huffman code length exceeds 15 bits",
            DecodeError::CodeLengthOverrun => "code-length repeat overruns HLIT+HDIST",
            DecodeError::NoPreviousCodeLength => "code-length repeat with no previous length",
            DecodeError::HuffmanEscape => "Huffman decode did not resolve within 15 bits",
            DecodeError::InvalidLiteralSymbol => "literal/length symbol out of range",
            DecodeError::InvalidDistanceSymbol => "distance symbol out of range",
            DecodeError::DistanceTooFar => "back-reference distance exceeds produced output",
            DecodeError::OutputOverflow => "write would exceed the output buffer",
            DecodeError::InputOutOfBounds => "read past the end of the archive",
            DecodeError::EocdNotFound => "no end-of-central-directory record found",
            DecodeError::CentralDirectorySignatureMismatch => "central directory signature mismatch",
            DecodeError::LocalHeaderSignatureMismatch => "local file header signature mismatch",
            DecodeError::EntryNotFound => "no matching entry in the central directory",
            DecodeError::UnsupportedCompressionMethod => "unsupported compression method",
            DecodeError::LengthMismatch => "decoded length does not match the recorded size",
            DecodeError::Crc32Mismatch => "decoded data fails its recorded CRC-32",
        };
        f.write_str(msg)
    }
}

impl core::error::Error for DecodeError {}
