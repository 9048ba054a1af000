//! Error types for shared parsing helpers.

use thiserror::Error;

/// Result type alias using CommonError.
pub type CommonResult<T> = Result<T, CommonError>;

#[derive(Debug, Error)]
pub enum CommonError {
    #[error("Invalid year-month token: {0}")]
    InvalidYearMonth(String),

    #[error("Invalid GeoTransform: {0}")]
    InvalidGeoTransform(String),

    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),
}
