//! Error types for the strex-core library.
//!
//! Extraction fails in exactly two ways: a read would run past the end of
//! the scanned range, or a string carries a length form the scanner does not
//! support. Both abort the whole call; no partial batch is ever returned.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for strex operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all strex operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A header, length extension, or string body would read past the end offset
    #[error(
        "unexpected end of buffer reading string at offset {offset}: \
         need {needed} bytes but the scan ends at {end}"
    )]
    BufferUnderrun {
        /// Offset where the failing read starts
        offset: usize,
        /// Number of bytes the read needed
        needed: usize,
        /// End offset of the scan
        end: usize,
    },

    /// An 8-byte length extension was found on a string or byte string
    #[error("length too large: 8-byte length extension at offset {offset}")]
    LengthTooLarge {
        /// Offset of the token header
        offset: usize,
    },

    /// Failed to read input file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        /// Path to the file that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Generic internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Creates a new buffer underrun error
    pub fn buffer_underrun(offset: usize, needed: usize, end: usize) -> Self {
        Self::BufferUnderrun {
            offset,
            needed,
            end,
        }
    }

    /// Creates a new length-too-large error
    pub fn length_too_large(offset: usize) -> Self {
        Self::LengthTooLarge { offset }
    }

    /// Creates a new file read error
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Creates a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns true if the error came from walking the buffer itself.
    ///
    /// A structural parser that sees one of these may fall back to decoding
    /// strings one token at a time.
    pub fn is_scan_error(&self) -> bool {
        matches!(self, Self::BufferUnderrun { .. } | Self::LengthTooLarge { .. })
    }
}
