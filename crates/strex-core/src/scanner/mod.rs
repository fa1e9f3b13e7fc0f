//! Bulk string extraction from length-prefixed binary documents.
//!
//! A structural parser that walks a CBOR or MessagePack document pays for a
//! separate decode and allocation on every string token. The [`Extractor`]
//! re-walks the same token stream ahead of it, decodes up to 256 strings in
//! one call, and hands them back as a batch that the parser consumes in
//! lock-step with its own walk.
//!
//! ## Algorithm Overview
//!
//! 1. Optionally process a string whose header the caller already read
//! 2. Classify each token header with a [`TokenFormat`]
//! 3. Skip byte strings and the headers of everything else
//! 4. Merge short ASCII strings into runs, decode the rest as UTF-8
//! 5. Stop after 255 materialized strings, then flush the pending run
//!
//! The walk is flat. Arrays, maps and tags consume only their own header and
//! their members are simply the next tokens, so no nesting is tracked. This
//! is sound only because the structural parser walks the same bytes.
//!
//! ## Example
//!
//! ```
//! use strex_core::{Extracted, Extractor};
//!
//! // ["ab", "cd"] in CBOR
//! let doc = [0x82, 0x62, b'a', b'b', 0x62, b'c', b'd'];
//! let mut extractor = Extractor::cbor();
//! let strings = extractor.extract_strings(&doc, 0, doc.len(), None)?;
//!
//! // Both strings merge into one run spanning bytes 2..7. The header byte
//! // between them (0x62) is part of the run and reads as 'b'.
//! assert_eq!(strings, Extracted::Single("abbcd".to_string()));
//! # Ok::<(), strex_core::Error>(())
//! ```

mod cbor;
mod feed;
mod format;
mod msgpack;
mod run;

use crate::error::{Error, Result};
use run::{RunAccumulator, RunLimits};
use tracing::{debug, trace};

pub use cbor::{Cbor, CBOR_MERGE_CAP, MAJOR_BYTES, MAJOR_TEXT};
pub use feed::{StringFeed, TextToken};
pub use format::{Format, Token, TokenFormat};
pub use msgpack::{MessagePack, MSGPACK_MERGE_CAP};

/// Materialized strings per call; one more slot is kept for the trailing run
pub const MAX_BATCH_ENTRIES: usize = 255;

/// Spans shorter than this are probed for single-byte content
pub const FAST_SCAN_LIMIT: usize = 0x100;

/// Largest gap in bytes between two spans that still merge into one run
pub const MAX_MERGE_GAP: usize = 40;

/// Result of one extraction call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    /// Exactly one string was produced
    Single(String),
    /// Zero or several strings, in document order
    Many(Vec<String>),
}

impl Extracted {
    /// Number of strings in the batch
    pub fn len(&self) -> usize {
        match self {
            Extracted::Single(_) => 1,
            Extracted::Many(items) => items.len(),
        }
    }

    /// Returns true if no strings were produced
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over the strings in document order
    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        match self {
            Extracted::Single(item) => std::slice::from_ref(item).iter(),
            Extracted::Many(items) => items.iter(),
        }
    }

    /// Converts the batch into a vector
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Extracted::Single(item) => vec![item],
            Extracted::Many(items) => items,
        }
    }
}

impl IntoIterator for Extracted {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.into_vec().into_iter()
    }
}

/// Configuration for the extractor
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Materialized strings after which a call stops early
    pub max_entries: usize,
    /// Spans shorter than this are probed for single-byte content
    pub fast_scan_limit: usize,
    /// Largest gap between spans that still merge
    pub max_gap: usize,
    /// Longest merged run (None = the format's default)
    pub merge_cap: Option<usize>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_entries: MAX_BATCH_ENTRIES,
            fast_scan_limit: FAST_SCAN_LIMIT,
            max_gap: MAX_MERGE_GAP,
            merge_cap: None,
        }
    }
}

impl ExtractorConfig {
    /// Creates a new extractor config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of materialized strings after which a call stops.
    ///
    /// Values above [`MAX_BATCH_ENTRIES`] are clamped; zero is raised to one.
    pub fn max_entries(mut self, max: usize) -> Self {
        self.max_entries = max.clamp(1, MAX_BATCH_ENTRIES);
        self
    }

    /// Sets the fast-scan threshold
    pub fn fast_scan_limit(mut self, limit: usize) -> Self {
        self.fast_scan_limit = limit;
        self
    }

    /// Sets the largest gap that still merges
    pub fn max_gap(mut self, gap: usize) -> Self {
        self.max_gap = gap;
        self
    }

    /// Overrides the format's merge cap
    pub fn merge_cap(mut self, cap: usize) -> Self {
        self.merge_cap = Some(cap);
        self
    }
}

/// Caller-owned string extractor.
///
/// Holds configuration and a scratch buffer reused across calls. Each call
/// borrows the extractor mutably, so one extractor serves one thread at a
/// time; give each worker its own.
#[derive(Debug, Clone)]
pub struct Extractor<F: TokenFormat = Cbor> {
    format: F,
    config: ExtractorConfig,
    batch: Vec<String>,
}

impl Extractor<Cbor> {
    /// Creates a CBOR extractor with default configuration
    pub fn cbor() -> Self {
        Self::new(Cbor)
    }
}

impl Extractor<MessagePack> {
    /// Creates a MessagePack extractor with default configuration
    pub fn msgpack() -> Self {
        Self::new(MessagePack)
    }
}

impl Default for Extractor<Cbor> {
    fn default() -> Self {
        Self::cbor()
    }
}

impl<F: TokenFormat> Extractor<F> {
    /// Creates a new extractor for `format` with default configuration
    pub fn new(format: F) -> Self {
        Self::with_config(format, ExtractorConfig::default())
    }

    /// Creates a new extractor with custom configuration.
    ///
    /// `max_entries` is clamped to `1..=`[`MAX_BATCH_ENTRIES`] however the
    /// config was built.
    pub fn with_config(format: F, mut config: ExtractorConfig) -> Self {
        config.max_entries = config.max_entries.clamp(1, MAX_BATCH_ENTRIES);
        Self {
            format,
            config,
            batch: Vec::with_capacity(MAX_BATCH_ENTRIES + 1),
        }
    }

    /// The wire format this extractor walks
    pub fn format(&self) -> &F {
        &self.format
    }

    /// The active configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    fn limits(&self) -> RunLimits {
        RunLimits {
            fast_scan_limit: self.config.fast_scan_limit,
            max_gap: self.config.max_gap,
            merge_cap: self
                .config
                .merge_cap
                .unwrap_or_else(|| self.format.default_merge_cap()),
        }
    }

    /// Extract the strings of `data[start..end]` in document order.
    ///
    /// `first_string_len` tells the extractor that a text string body of
    /// that many bytes begins exactly at `start` (its header was already
    /// read by the caller). `None` means the scan starts at a token header.
    ///
    /// The call stops early once [`ExtractorConfig::max_entries`] strings
    /// have been materialized; the caller resumes from wherever its own walk
    /// has reached. On error nothing is returned.
    pub fn extract_strings(
        &mut self,
        data: &[u8],
        start: usize,
        end: usize,
        first_string_len: Option<usize>,
    ) -> Result<Extracted> {
        if end > data.len() {
            return Err(Error::buffer_underrun(data.len(), end - data.len(), data.len()));
        }

        self.batch.clear();
        let result = self.scan(data, start, end, first_string_len);
        if result.is_err() {
            self.batch.clear();
        }
        result
    }

    fn scan(
        &mut self,
        data: &[u8],
        start: usize,
        end: usize,
        first_string_len: Option<usize>,
    ) -> Result<Extracted> {
        let mut acc = RunAccumulator::new(self.limits());
        let mut position = start;

        if let Some(len) = first_string_len {
            let stop = span_end(start, len, end)?;
            acc.push(data, start..stop, &mut self.batch);
            position = stop;
        }

        while position < end && self.batch.len() < self.config.max_entries {
            let token = self.format.read_token(data, position, end)?;
            match token {
                Token::Text { header, len } => {
                    let body = position + header;
                    let body_end = span_end(body, len, end)?;
                    acc.push(data, body..body_end, &mut self.batch);
                    position = body_end;

                    if self.batch.len() >= self.config.max_entries {
                        trace!(
                            "Batch full at offset {} with {} strings (pending run: {})",
                            position,
                            self.batch.len(),
                            acc.has_run()
                        );
                        break;
                    }
                }
                Token::Binary { .. } | Token::Other { .. } => {
                    position = token.next_offset(position);
                }
            }
        }

        let trailing = acc.take(data);
        let materialized = self.batch.len();

        debug!(
            "Extracted {} strings ({} format) from {}..{}{}",
            materialized + usize::from(trailing.is_some()),
            self.format.name(),
            start,
            end,
            if trailing.is_some() { ", trailing run" } else { "" }
        );

        Ok(match trailing {
            Some(run) if materialized == 0 => Extracted::Single(run),
            Some(run) => {
                self.batch.push(run);
                Extracted::Many(self.batch.drain(..).collect())
            }
            None if materialized == 1 => Extracted::Single(self.batch.remove(0)),
            None => Extracted::Many(self.batch.drain(..).collect()),
        })
    }

    /// Iterate over every text token from `start` to `end`, refilling the
    /// batch as needed.
    pub fn feed<'a>(&'a mut self, data: &'a [u8], start: usize, end: usize) -> StringFeed<'a, F> {
        StringFeed::new(self, data, start, end)
    }
}

/// End of a body of `len` bytes at `body`, bounded by `end`.
fn span_end(body: usize, len: usize, end: usize) -> Result<usize> {
    body.checked_add(len)
        .filter(|&stop| stop <= end)
        .ok_or_else(|| Error::buffer_underrun(body, len, end))
}

/// Read a file and extract the strings of its first batch.
///
/// This is a convenience function that reads the whole file and scans it
/// from `start` to the end of the file.
pub fn extract_file(
    path: impl AsRef<std::path::Path>,
    format: Format,
    start: usize,
    first_string_len: Option<usize>,
) -> Result<Extracted> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|e| Error::file_read(path, e))?;
    Extractor::new(format).extract_strings(&data, start, data.len(), first_string_len)
}
