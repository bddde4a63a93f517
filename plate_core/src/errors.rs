//! # Error Types
//!
//! Structured error types for plate_core. Every fatal condition of a run
//! (bad configuration, bad library, bad input rows, file failures) maps to one
//! variant with enough context to locate and fix the problem.
//!
//! A segment without any feasible plate combination is *not* an error: it is
//! reported as a selection with no winner (see [`crate::selection::ranker`]).
//!
//! ## Example
//!
//! ```rust
//! use plate_core::errors::{PlateError, PlateResult};
//!
//! fn validate_bay(bay_spacing_m: f64) -> PlateResult<()> {
//!     if bay_spacing_m <= 0.0 {
//!         return Err(PlateError::config(
//!             "bay_spacing_m",
//!             format!("bay spacing must be positive, got {}", bay_spacing_m),
//!         ));
//!     }
//!     Ok(())
//! }
//!
//! assert_eq!(validate_bay(0.0).unwrap_err().error_code(), "CONFIG_ERROR");
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for plate_core operations
pub type PlateResult<T> = Result<T, PlateError>;

/// Structured error type for selection runs.
///
/// All variants are fatal for the run: the driver stops before any partial
/// processing.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum PlateError {
    /// Malformed or contradictory configuration
    #[error("Configuration error in '{key}': {reason}")]
    Config { key: String, reason: String },

    /// Empty or malformed plate library
    #[error("Plate library error in '{table}'{}: {reason}", fmt_row(.row))]
    Library {
        table: String,
        row: Option<usize>,
        reason: String,
    },

    /// An input row value is invalid
    #[error("Invalid input{} for '{field}': {value} - {reason}", fmt_row(.row))]
    InvalidInput {
        row: Option<usize>,
        field: String,
        value: String,
        reason: String,
    },

    /// A required column is missing from a table
    #[error("Missing required column '{field}' in '{table}'")]
    MissingField { table: String, field: String },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    File {
        operation: String,
        path: String,
        reason: String,
    },

    /// Serialization/deserialization error (config documents, JSON report)
    #[error("Serialization error: {reason}")]
    Serialization { reason: String },
}

fn fmt_row(row: &Option<usize>) -> String {
    match row {
        Some(r) => format!(" (row {})", r),
        None => String::new(),
    }
}

impl PlateError {
    /// Create a Config error
    pub fn config(key: impl Into<String>, reason: impl Into<String>) -> Self {
        PlateError::Config {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create a Library error
    pub fn library(table: impl Into<String>, row: Option<usize>, reason: impl Into<String>) -> Self {
        PlateError::Library {
            table: table.into(),
            row,
            reason: reason.into(),
        }
    }

    /// Create an InvalidInput error
    pub fn invalid_input(
        row: Option<usize>,
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        PlateError::InvalidInput {
            row,
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(table: impl Into<String>, field: impl Into<String>) -> Self {
        PlateError::MissingField {
            table: table.into(),
            field: field.into(),
        }
    }

    /// Create a File error
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        PlateError::File {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a Serialization error
    pub fn serialization(reason: impl Into<String>) -> Self {
        PlateError::Serialization {
            reason: reason.into(),
        }
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            PlateError::Config { .. } => "CONFIG_ERROR",
            PlateError::Library { .. } => "LIBRARY_ERROR",
            PlateError::InvalidInput { .. } => "INVALID_INPUT",
            PlateError::MissingField { .. } => "MISSING_FIELD",
            PlateError::File { .. } => "FILE_ERROR",
            PlateError::Serialization { .. } => "SERIALIZATION_ERROR",
        }
    }

    /// Process exit code the CLI reports for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            PlateError::Config { .. } => 2,
            PlateError::Library { .. } => 3,
            PlateError::InvalidInput { .. } | PlateError::MissingField { .. } => 4,
            PlateError::File { .. } | PlateError::Serialization { .. } => 5,
        }
    }
}
