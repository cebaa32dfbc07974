//! Error types for GRIB2 decoding.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Grib2Error {
    #[error("Failed to open GRIB2 file {path}: {message}")]
    Open { path: String, message: String },

    #[error("Failed to decode GRIB2 data: {0}")]
    Decode(String),

    #[error("Unsupported grid: {0}")]
    UnsupportedGrid(String),

    #[error("Grid shape mismatch: expected {expected} points, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Decode handle for {0} is poisoned")]
    Poisoned(String),
}

impl From<grib::GribError> for Grib2Error {
    fn from(err: grib::GribError) -> Self {
        Grib2Error::Decode(err.to_string())
    }
}

/// Result type for GRIB2 operations.
pub type Grib2Result<T> = std::result::Result<T, Grib2Error>;
