//! Token header classification shared by the supported wire formats.
//!
//! The scanner never builds a document tree. It only needs to know, for the
//! token at the cursor, how many header bytes it occupies and whether it
//! carries a text or binary body that follows the header. Container tokens
//! (arrays, maps, tags) report only their own header; their members are the
//! tokens that follow.

use super::cbor::Cbor;
use super::msgpack::MessagePack;
use crate::error::{Error, Result};

/// A classified token header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// Text string with `len` content bytes after `header` bytes
    Text {
        /// Header bytes including length extension
        header: usize,
        /// Content length in bytes
        len: usize,
    },
    /// Opaque body (byte strings, extension payloads), skipped unread
    Binary {
        /// Header bytes including length extension
        header: usize,
        /// Content length in bytes
        len: usize,
    },
    /// Anything else; only the header is consumed
    Other {
        /// Header bytes including any extension bytes
        header: usize,
    },
}

impl Token {
    /// Bytes occupied by the header
    pub fn header_len(&self) -> usize {
        match *self {
            Token::Text { header, .. } | Token::Binary { header, .. } | Token::Other { header } => {
                header
            }
        }
    }

    /// Offset of the token following this one when it starts at `position`
    pub fn next_offset(&self, position: usize) -> usize {
        let body = match *self {
            Token::Text { len, .. } | Token::Binary { len, .. } => len,
            Token::Other { .. } => 0,
        };
        position
            .saturating_add(self.header_len())
            .saturating_add(body)
    }
}

/// A length-prefixed wire format the scanner can walk.
///
/// Implementations classify one token header at a time. `read_token` is only
/// called with `position < end <= data.len()`, and it must not read at or
/// beyond `end` when resolving a text or binary length.
pub trait TokenFormat: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Largest merged run, in bytes, before a pending run is flushed
    fn default_merge_cap(&self) -> usize;

    /// Classify the token whose header byte is at `position`
    fn read_token(&self, data: &[u8], position: usize, end: usize) -> Result<Token>;
}

/// Read a big-endian unsigned integer of `width` bytes at `offset`.
pub(crate) fn read_be(data: &[u8], offset: usize, width: usize, end: usize) -> Result<usize> {
    let stop = offset
        .checked_add(width)
        .filter(|&stop| stop <= end)
        .ok_or_else(|| Error::buffer_underrun(offset, width, end))?;

    Ok(data[offset..stop]
        .iter()
        .fold(0usize, |acc, &b| (acc << 8) | usize::from(b)))
}

/// Runtime-selected wire format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// CBOR (RFC 8949)
    #[default]
    Cbor,
    /// MessagePack
    MessagePack,
}

impl Format {
    /// Guess the format from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "cbor" => Some(Format::Cbor),
            "msgpack" | "mpk" => Some(Format::MessagePack),
            _ => None,
        }
    }
}

impl TokenFormat for Format {
    fn name(&self) -> &'static str {
        match self {
            Format::Cbor => Cbor.name(),
            Format::MessagePack => MessagePack.name(),
        }
    }

    fn default_merge_cap(&self) -> usize {
        match self {
            Format::Cbor => Cbor.default_merge_cap(),
            Format::MessagePack => MessagePack.default_merge_cap(),
        }
    }

    fn read_token(&self, data: &[u8], position: usize, end: usize) -> Result<Token> {
        match self {
            Format::Cbor => Cbor.read_token(data, position, end),
            Format::MessagePack => MessagePack.read_token(data, position, end),
        }
    }
}
