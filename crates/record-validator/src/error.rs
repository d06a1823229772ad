//! Validation Error Types

use thiserror::Error;

/// Errors while turning raw rows into records
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Required column absent from the batch header
    #[error("Missing required column: {0}")]
    MissingColumn(&'static str),

    /// Required field empty on a row
    #[error("Row {row}: missing required field {field}")]
    MissingField { row: usize, field: &'static str },

    /// Age is not a non-negative integer
    #[error("Row {row}: invalid age {value:?}")]
    InvalidAge { row: usize, value: String },

    /// Row shorter than the header
    #[error("Row {row} has {actual} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
}
