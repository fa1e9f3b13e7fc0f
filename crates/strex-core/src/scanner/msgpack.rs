//! MessagePack token header parsing.
//!
//! MessagePack identifies each token by its first byte alone. Strings are
//! `fixstr` (0xa0..=0xbf, length in the low 5 bits) and `str8/16/32`
//! (0xd9..=0xdb). Containers (`fixmap`, `fixarray`, `array16/32`,
//! `map16/32`) only occupy their header, like every other non-string token.

use super::format::{read_be, Token, TokenFormat};
use crate::error::Result;

/// Longest merged run for MessagePack documents
pub const MSGPACK_MERGE_CAP: usize = 4000;

/// The MessagePack wire format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessagePack;

impl MessagePack {
    /// Token with a length field of `width` bytes, `extra` fixed bytes
    /// (the ext type byte) and then the body.
    fn sized(
        data: &[u8],
        position: usize,
        end: usize,
        width: usize,
        extra: usize,
        text: bool,
    ) -> Result<Token> {
        let len = read_be(data, position + 1, width, end)?;
        let header = 1 + width + extra;
        Ok(if text {
            Token::Text { header, len }
        } else {
            Token::Binary { header, len }
        })
    }
}

impl TokenFormat for MessagePack {
    fn name(&self) -> &'static str {
        "msgpack"
    }

    fn default_merge_cap(&self) -> usize {
        MSGPACK_MERGE_CAP
    }

    fn read_token(&self, data: &[u8], position: usize, end: usize) -> Result<Token> {
        let byte = data[position];
        let other = |header: usize| -> Result<Token> { Ok(Token::Other { header }) };

        match byte {
            // fixstr
            0xa0..=0xbf => Ok(Token::Text {
                header: 1,
                len: usize::from(byte & 0x1f),
            }),
            // str8, str16, str32
            0xd9 => Self::sized(data, position, end, 1, 0, true),
            0xda => Self::sized(data, position, end, 2, 0, true),
            0xdb => Self::sized(data, position, end, 4, 0, true),
            // bin8, bin16, bin32
            0xc4 => Self::sized(data, position, end, 1, 0, false),
            0xc5 => Self::sized(data, position, end, 2, 0, false),
            0xc6 => Self::sized(data, position, end, 4, 0, false),
            // ext8, ext16, ext32 carry a type byte after the length
            0xc7 => Self::sized(data, position, end, 1, 1, false),
            0xc8 => Self::sized(data, position, end, 2, 1, false),
            0xc9 => Self::sized(data, position, end, 4, 1, false),
            // float32, float64
            0xca => other(5),
            0xcb => other(9),
            // uint8..uint64, int8..int64
            0xcc | 0xd0 => other(2),
            0xcd | 0xd1 => other(3),
            0xce | 0xd2 => other(5),
            0xcf | 0xd3 => other(9),
            // fixext1..fixext16: type byte plus fixed data
            0xd4 => other(3),
            0xd5 => other(4),
            0xd6 => other(6),
            0xd7 => other(10),
            0xd8 => other(18),
            // array16, map16, array32, map32
            0xdc | 0xde => other(3),
            0xdd | 0xdf => other(5),
            // positive/negative fixint, fixmap, fixarray, nil, bool, 0xc1
            _ => other(1),
        }
    }
}
