//! Error types for thematic-viz operations.
//!
//! Only programmer misuse surfaces as an [`Error`]. Data variability (empty
//! arrays, nulls, zeros) is recovered into neutral styling and never reaches
//! this type.

use std::io;
use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in thematic-viz operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error (configuration files, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Unrecognised `(geometry, variant)` style identifier.
    #[error("invalid style combination: {0}")]
    InvalidStyleCombination(String),

    /// Expression is not the interpolation shape an adjustment expects.
    #[error("malformed expression: {0}")]
    MalformedExpression(String),

    /// Layer/geometry type without a paint property mapping.
    #[error("unknown geometry type: {0}")]
    UnknownGeometryType(String),

    /// Color parsing error.
    #[error("invalid color: {0}")]
    InvalidColor(String),

    /// Configuration parsing error with line number.
    #[error("configuration error at line {line}: {message}")]
    ConfigParse {
        /// Line number where the error occurred (1-indexed, 0 if unknown).
        line: usize,
        /// Error message describing the issue.
        message: String,
    },

    /// Configuration file not found.
    #[error("configuration file not found: {0}")]
    ConfigNotFound(String),
}
