//! Error types for csvgrid

use thiserror::Error;

/// Main error type for csvgrid operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid grid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Value slot {slot} out of range (grid holds {num_values} values per cell)")]
    SlotOutOfRange { slot: usize, num_values: usize },

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Line {line}: column {column} is not a finite number: {value:?}")]
    MalformedField {
        line: usize,
        column: usize,
        value: String,
    },

    #[error("Line {line}: variable {tag} was not seen during the pre-scan")]
    SchemaViolation { line: usize, tag: String },

    #[error("Algorithm error: {0}")]
    Algorithm(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for an [`Error::InvalidParameter`].
    pub fn invalid(name: &'static str, value: impl ToString, reason: impl Into<String>) -> Self {
        Error::InvalidParameter {
            name,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for csvgrid operations
pub type Result<T> = std::result::Result<T, Error>;
