//! # Error Types
//!
//! Errors raised by the data engine. Most of the engine is infallible by
//! construction: a traversal that does not reach its target returns `None`,
//! and issue mapping always finds a bucket. What remains are parse errors
//! for textual paths and serialization failures while canonicalizing.

use thiserror::Error;

/// A textual path (`a.b[0].c`) could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// Two separators with nothing between them, or a leading/trailing dot.
    #[error("empty segment at offset {offset} in path '{path}'")]
    EmptySegment {
        /// The path text being parsed.
        path: String,
        /// Byte offset of the empty segment.
        offset: usize,
    },

    /// A `[` without its closing `]`.
    #[error("unterminated bracket at offset {offset} in path '{path}'")]
    UnterminatedBracket {
        /// The path text being parsed.
        path: String,
        /// Byte offset of the opening bracket.
        offset: usize,
    },

    /// A key runs straight into a preceding `]` without a dot.
    #[error("missing '.' before offset {offset} in path '{path}'")]
    MissingSeparator {
        /// The path text being parsed.
        path: String,
        /// Byte offset of the unexpected character.
        offset: usize,
    },

    /// Bracket content that is neither an index nor a quoted key.
    #[error("invalid bracket segment '[{segment}]' in path '{path}'")]
    InvalidBracket {
        /// The path text being parsed.
        path: String,
        /// The raw bracket content.
        segment: String,
    },
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}
