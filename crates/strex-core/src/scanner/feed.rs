//! Token-by-token consumption of extracted batches.
//!
//! [`StringFeed`] plays the part of the structural parser: it walks the
//! document itself and, for every text token it meets, takes the matching
//! string from the current batch. When the batch runs dry it calls the
//! extractor again from that token, passing the token's length as the
//! first-string hint. Merged runs are sliced by offset, so every text token
//! gets exactly its own string.

use std::collections::VecDeque;

use tracing::trace;

use super::{span_end, Extractor, Token, TokenFormat};
use crate::error::{Error, Result};
use crate::text::{decode_latin1, encode_latin1};

/// A decoded text token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextToken {
    /// Offset of the string body (just past its header)
    pub offset: usize,
    /// Decoded text
    pub text: String,
}

/// A materialized run and the document offset it starts at
#[derive(Debug)]
struct Window {
    start: usize,
    bytes: Vec<u8>,
}

impl Window {
    fn slice(&self, body: usize, len: usize) -> Option<&[u8]> {
        let rel = body.checked_sub(self.start)?;
        self.bytes.get(rel..rel.checked_add(len)?)
    }
}

/// Iterator over every text token of a document range.
///
/// Created by [`Extractor::feed`]. Yields an error once and then stops if
/// the document is malformed.
pub struct StringFeed<'a, F: TokenFormat> {
    extractor: &'a mut Extractor<F>,
    data: &'a [u8],
    position: usize,
    end: usize,
    pending: VecDeque<String>,
    window: Option<Window>,
    batches: usize,
    done: bool,
}

impl<'a, F: TokenFormat> StringFeed<'a, F> {
    pub(crate) fn new(
        extractor: &'a mut Extractor<F>,
        data: &'a [u8],
        start: usize,
        end: usize,
    ) -> Self {
        Self {
            extractor,
            data,
            position: start,
            end,
            pending: VecDeque::new(),
            window: None,
            batches: 0,
            done: false,
        }
    }

    /// Number of extraction calls made so far
    pub fn batches(&self) -> usize {
        self.batches
    }

    fn advance(&mut self) -> Result<Option<TextToken>> {
        if self.end > self.data.len() {
            let len = self.data.len();
            return Err(Error::buffer_underrun(len, self.end - len, len));
        }

        while self.position < self.end {
            let token = self
                .extractor
                .format()
                .read_token(self.data, self.position, self.end)?;

            match token {
                Token::Text { header, len } => {
                    let body = self.position + header;
                    let body_end = span_end(body, len, self.end)?;
                    let text = self.take(body, len)?;
                    self.position = body_end;
                    return Ok(Some(TextToken { offset: body, text }));
                }
                Token::Binary { .. } | Token::Other { .. } => {
                    self.position = token.next_offset(self.position);
                }
            }
        }
        Ok(None)
    }

    /// Take the string for the text body `data[body..body + len]`.
    fn take(&mut self, body: usize, len: usize) -> Result<String> {
        if let Some(bytes) = self.window.as_ref().and_then(|w| w.slice(body, len)) {
            return Ok(decode_latin1(bytes));
        }
        self.window = None;

        if self.pending.is_empty() {
            let batch = self
                .extractor
                .extract_strings(self.data, body, self.end, Some(len))?;
            self.batches += 1;
            trace!(
                "Batch {} at offset {}: {} strings",
                self.batches,
                body,
                batch.len()
            );
            self.pending.extend(batch);
        }

        let entry = self.pending.pop_front().ok_or_else(|| {
            Error::internal(format!("no string extracted for token at offset {}", body))
        })?;

        // A run covers this token and possibly the ones after it. A string
        // that needed UTF-8 decoding is always shorter in characters than
        // in bytes, so it never passes this check.
        match encode_latin1(&entry) {
            Some(bytes) if bytes.len() >= len => {
                let text = decode_latin1(&bytes[..len]);
                self.window = Some(Window { start: body, bytes });
                Ok(text)
            }
            _ => Ok(entry),
        }
    }
}

impl<F: TokenFormat> Iterator for StringFeed<'_, F> {
    type Item = Result<TextToken>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.advance() {
            Ok(Some(token)) => Some(Ok(token)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
