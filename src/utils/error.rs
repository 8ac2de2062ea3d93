//! Error types for the image converter.
//!
//! Provides a hierarchy of error types using `thiserror` for ergonomic error handling.

use std::io;
use thiserror::Error;
use serde::Serialize;

/// Validation errors for conversion options.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ValidationError {
    /// A single field of the options failed its constraint
    #[error("{field}: {message}")]
    Field {
        field: String,
        message: String,
    },
}

/// Main error type for the converter.
///
/// Per-item processing failures are recorded on the ledger record as plain
/// strings; this type is what callers of the library see.
#[derive(Error, Debug, Serialize)]
pub enum ConverterError {
    /// Options or input validation failed
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Image processing failed
    #[error("Processing error: {0}")]
    Processing(String),

    /// File IO error
    #[error("IO error: {0}")]
    IO(String),

    /// Unsupported or invalid image format
    #[error("Format error: {0}")]
    Format(String),

    /// Output location could not be resolved
    #[error("Destination error: {0}")]
    Destination(String),

    /// Settings store read or write failed
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// A batch is already running on this state
    #[error("A batch is already in progress")]
    BatchInProgress,

    /// Lookup by id failed
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Convenience result type for converter operations.
pub type ConverterResult<T> = Result<T, ConverterError>;

// Helper methods for error creation
impl ConverterError {
    pub fn processing<T: Into<String>>(msg: T) -> Self {
        Self::Processing(msg.into())
    }

    pub fn io<T: Into<String>>(msg: T) -> Self {
        Self::IO(msg.into())
    }

    pub fn format<T: Into<String>>(msg: T) -> Self {
        Self::Format(msg.into())
    }

    pub fn destination<T: Into<String>>(msg: T) -> Self {
        Self::Destination(msg.into())
    }

    pub fn persistence<T: Into<String>>(msg: T) -> Self {
        Self::Persistence(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        Self::NotFound(msg.into())
    }
}

// Helper methods for validation error creation
impl ValidationError {
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Field {
            field: field.into(),
            message: message.into(),
        }
    }
}

// Convert std::io::Error to ConverterError
impl From<io::Error> for ConverterError {
    fn from(err: io::Error) -> Self {
        Self::IO(err.to_string())
    }
}

impl From<serde_json::Error> for ConverterError {
    fn from(err: serde_json::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}
