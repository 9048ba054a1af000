//! Error types for trend table I/O.

use thiserror::Error;

/// Result type for trend analysis operations.
pub type TrendResult<T> = Result<T, TrendError>;

/// Errors that abort a whole table operation.
///
/// Failures of a single (unit, variable) test are not errors; they are
/// carried as [`crate::TrendFailure`] inside the result row.
#[derive(Error, Debug)]
pub enum TrendError {
    /// CSV parsing or writing failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A required column is absent from the table
    #[error("Missing column: {0}")]
    MissingColumn(String),
}
