//! Error types for the extraction crate.

use thiserror::Error;

/// Errors that can occur while extracting one variable.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Variable {0} not found in GRIB2 file")]
    VariableNotFound(String),

    #[error("Region lat [{lat_min}, {lat_max}] lon [{lon_min}, {lon_max}] selects no grid points")]
    CropOutOfRange {
        lat_min: f64,
        lat_max: f64,
        lon_min: f64,
        lon_max: f64,
    },

    #[error("Failed to decode GRIB2 data: {0}")]
    Decode(#[from] grib2_parser::Grib2Error),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Extraction worker failed: {0}")]
    Worker(String),
}

impl ExtractError {
    pub fn write(path: &std::path::Path, source: std::io::Error) -> Self {
        ExtractError::Write {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractError>;
