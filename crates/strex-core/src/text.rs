//! Text decoding helpers shared by the scanner and its consumers.

/// Highest code point that fits in a single Latin-1 byte
const MAX_ONE_BYTE: u32 = 0xFF;

/// Reports whether `value` could be stored using one byte per character.
///
/// True when every character is at most U+00FF, i.e. the string is
/// representable in Latin-1. Encoders use this to pick a compact
/// representation when writing strings back out.
pub fn is_single_byte_encodable(value: &str) -> bool {
    value.chars().all(|c| u32::from(c) <= MAX_ONE_BYTE)
}

/// Length of the leading run of bytes below 0x80.
pub(crate) fn ascii_prefix_len(bytes: &[u8]) -> usize {
    bytes
        .iter()
        .position(|&b| b >= 0x80)
        .unwrap_or(bytes.len())
}

/// Decodes each byte as one Latin-1 character.
pub(crate) fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Decodes UTF-8, replacing malformed sequences with U+FFFD.
pub(crate) fn decode_utf8(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Re-encodes a single-byte string as its original bytes.
///
/// Returns `None` if any character is above U+00FF.
pub(crate) fn encode_latin1(value: &str) -> Option<Vec<u8>> {
    value
        .chars()
        .map(|c| u8::try_from(u32::from(c)).ok())
        .collect()
}
