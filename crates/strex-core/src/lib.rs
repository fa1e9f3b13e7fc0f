//! # strex-core
//!
//! Bulk string extraction for CBOR and MessagePack buffers.
//!
//! Decoding strings one token at a time is the dominant cost when parsing
//! string-heavy binary documents. This crate walks the token stream ahead of
//! a structural parser and decodes strings in batches of up to 256, merging
//! runs of short ASCII strings into a single allocation.
//!
//! ## Architecture
//!
//! - [`scanner`]: token classification, run merging, batching
//! - [`text`]: single-byte encodability and decoding helpers
//! - [`error`]: Error types and handling
//!
//! ## Example
//!
//! ```
//! use strex_core::{Extractor, TokenFormat};
//!
//! // {"name": "zoë"} in CBOR
//! let doc = [0xa1, 0x64, b'n', b'a', b'm', b'e', 0x64, b'z', b'o', 0xc3, 0xab];
//!
//! let mut extractor = Extractor::cbor();
//! let batch = extractor.extract_strings(&doc, 0, doc.len(), None)?;
//! assert_eq!(batch.into_vec(), vec!["name".to_string(), "zoë".to_string()]);
//!
//! // Or consume one string per text token, refilling batches as needed
//! let texts: Vec<String> = extractor
//!     .feed(&doc, 0, doc.len())
//!     .map(|token| token.map(|t| t.text))
//!     .collect::<Result<_, _>>()?;
//! assert_eq!(texts, ["name", "zoë"]);
//! assert_eq!(extractor.format().name(), "cbor");
//! # Ok::<(), strex_core::Error>(())
//! ```
//!
//! ## Extensibility
//!
//! The [`TokenFormat`] trait lets the extractor walk other length-prefixed
//! formats: implement header classification and pick a merge cap.

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod error;
pub mod scanner;
pub mod text;

// Re-export primary types for convenience
pub use error::{Error, Result};
pub use scanner::{
    extract_file, Cbor, Extracted, Extractor, ExtractorConfig, Format, MessagePack, StringFeed,
    TextToken, Token, TokenFormat,
};
pub use text::is_single_byte_encodable;

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
