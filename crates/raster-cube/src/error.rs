//! Error types for cube assembly.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for cube operations.
pub type CubeResult<T> = Result<T, CubeError>;

/// Error types for cube assembly and writing.
#[derive(Error, Debug)]
pub enum CubeError {
    /// No raster slices were found in the input folder
    #[error("No NetCDF files found in {0}")]
    NoInput(PathBuf),

    /// CRS WKT or GeoTransform could not be read from the reference slice
    #[error("Missing georeference in {path}: {detail}")]
    MissingGeoreference { path: PathBuf, detail: String },

    /// A slice grid differs in shape from the reference slice
    #[error("Shape mismatch in {path}: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        path: PathBuf,
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// Slice timestamps are not strictly increasing after sorting
    #[error("Time axis not strictly increasing at {0}")]
    UnorderedTime(String),

    /// Missing required variable, dimension or attribute
    #[error("Missing required data: {0}")]
    MissingData(String),

    /// Filename does not end in a `_YYYYMM` token
    #[error("Invalid slice filename {path}: {reason}")]
    InvalidFilename { path: PathBuf, reason: String },

    /// Error reported by the NetCDF library
    #[error("NetCDF error: {0}")]
    NetCdf(String),

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<netcdf::Error> for CubeError {
    fn from(e: netcdf::Error) -> Self {
        CubeError::NetCdf(e.to_string())
    }
}
