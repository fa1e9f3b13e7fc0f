//! CBOR token header parsing.
//!
//! ## Header Layout
//!
//! Every CBOR data item starts with one initial byte:
//! - the high 3 bits select the major type
//! - the low 5 bits hold a short argument, or select a length extension
//!
//! Low field values:
//! - 0..=23: the argument itself
//! - 24/25/26/27: a 1/2/4/8-byte big-endian argument follows
//! - 28..=30: reserved
//! - 31: indefinite length (strings, arrays, maps) or the break marker
//!
//! Major types:
//! - 0/1: unsigned / negative integer
//! - 2: byte string
//! - 3: text string
//! - 4/5: array / map (header only, members follow)
//! - 6: tag (header only, tagged item follows)
//! - 7: simple values and floats

use super::format::{read_be, Token, TokenFormat};
use crate::error::{Error, Result};

/// Major type of a byte string
pub const MAJOR_BYTES: u8 = 2;

/// Major type of a text string
pub const MAJOR_TEXT: u8 = 3;

/// Longest merged run for CBOR documents
pub const CBOR_MERGE_CAP: usize = 6000;

const LEN_U8: u8 = 0x18;
const LEN_U16: u8 = 0x19;
const LEN_U32: u8 = 0x1a;
const LEN_U64: u8 = 0x1b;

/// Bytes that follow the initial byte for a given low field
fn extension_width(low: u8) -> usize {
    match low {
        LEN_U8 => 1,
        LEN_U16 => 2,
        LEN_U32 => 4,
        LEN_U64 => 8,
        _ => 0,
    }
}

/// The CBOR wire format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cbor;

impl TokenFormat for Cbor {
    fn name(&self) -> &'static str {
        "cbor"
    }

    fn default_merge_cap(&self) -> usize {
        CBOR_MERGE_CAP
    }

    fn read_token(&self, data: &[u8], position: usize, end: usize) -> Result<Token> {
        let initial = data[position];
        let major = initial >> 5;
        let low = initial & 0x1f;

        if major != MAJOR_BYTES && major != MAJOR_TEXT {
            return Ok(Token::Other {
                header: 1 + extension_width(low),
            });
        }

        let (header, len) = match low {
            0..=0x17 => (1, usize::from(low)),
            LEN_U8 | LEN_U16 | LEN_U32 => {
                let width = extension_width(low);
                (1 + width, read_be(data, position + 1, width, end)?)
            }
            LEN_U64 => return Err(Error::length_too_large(position)),
            // Indefinite-length strings are a header followed by definite
            // chunks, which the scan visits as ordinary tokens. Reserved
            // values carry no body either.
            _ => return Ok(Token::Other { header: 1 }),
        };

        Ok(if major == MAJOR_TEXT {
            Token::Text { header, len }
        } else {
            Token::Binary { header, len }
        })
    }
}
