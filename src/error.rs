//! Error types for the taint layer
//!
//! Only recoverable, externally caused failures live here. Violations of the
//! range index invariants are bugs in the caller and panic instead.

use std::io;
use thiserror::Error;

/// Result type alias for fallible taint operations
pub type TaintResult<T> = Result<T, TaintError>;

/// Top-level error type
#[derive(Debug, Error)]
pub enum TaintError {
    /// Malformed diagnostic taint text
    #[error("Text format error: {0}")]
    Text(#[from] TextError),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Rejection reasons of the textual taint decoder.
///
/// The public decoder degrades every one of these to the untainted state;
/// they are surfaced only through `try_parse_taint` for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TextError {
    /// Input does not start with `[` or does not end with `]`
    #[error("Malformed taint list: expected '[' ... ']'")]
    MalformedList,

    /// Input ended in the middle of a construct
    #[error("Unexpected end of input at offset {offset}")]
    UnexpectedEnd { offset: usize },

    /// A character that cannot start or continue the current construct
    #[error("Unexpected character {found:?} at offset {offset}")]
    UnexpectedChar { found: char, offset: usize },

    /// String literal without a closing quote
    #[error("Unterminated string literal starting at offset {offset}")]
    UnterminatedString { offset: usize },

    /// Integer value that is not a valid u32
    #[error("Invalid integer {value:?} for key '{key}'")]
    InvalidInteger { key: &'static str, value: String },

    /// A range object lacks one of `begin`, `end`, `source`
    #[error("Taint range at offset {offset} is missing key '{key}'")]
    MissingKey { key: &'static str, offset: usize },

    /// `begin` greater than `end` inside one range
    #[error("Inverted taint range {begin} - {end}")]
    InvertedRange { begin: u32, end: u32 },

    /// Range begins before the previous range ended
    #[error("Taint range {begin} - {end} starts before previous end {previous_end}")]
    Overlapping {
        begin: u32,
        end: u32,
        previous_end: u32,
    },
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error while reading a config file
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Config file is not valid JSON for `TaintConfig`
    #[error("Invalid config: {0}")]
    Json(#[from] serde_json::Error),
}
