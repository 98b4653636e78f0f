//! Error types for the jplephem module
//!
//! This module defines error types for reading binary SPK kernels.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for jplephem functionality
#[derive(Error, Debug)]
pub enum JplephemError {
    /// Error when a file I/O operation fails
    #[error("File I/O error on {path:?}: {source}")]
    FileError {
        /// The path of the file that caused the error
        path: PathBuf,
        /// The underlying I/O error
        source: std::io::Error,
    },

    /// Error when an epoch is outside the range covered by a segment
    #[error("Epoch {et} is outside ephemeris range ({start_et}..{end_et})")]
    OutOfRange {
        /// The requested epoch (TDB seconds past J2000)
        et: f64,
        /// The start of the covered range
        start_et: f64,
        /// The end of the covered range
        end_et: f64,
    },

    /// Error when the file format is invalid or unsupported
    #[error("Invalid file format: {0}")]
    InvalidFormat(String),

    /// Error when no loaded segment can provide data for the requested body
    #[error("Insufficient ephemeris data for body {target} at epoch {et}")]
    NoCoverage {
        /// The body whose state was requested
        target: i32,
        /// The requested epoch
        et: f64,
    },

    /// Error when the segment data type is not supported
    #[error("Unsupported SPK data type: {0}")]
    UnsupportedDataType(i32),
}

/// Extension of the Result type for jplephem operations
pub type Result<T> = std::result::Result<T, JplephemError>;

/// Helper function to convert a std::io::Error to JplephemError
pub fn io_err(path: impl Into<PathBuf>, err: std::io::Error) -> JplephemError {
    JplephemError::FileError {
        path: path.into(),
        source: err,
    }
}
