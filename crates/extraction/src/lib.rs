//! Variable extraction from GFS GRIB2 files.
//!
//! Given a decoded GRIB2 file, pulls out one catalogued variable, optionally
//! crops it to a region by its coordinate axes and persists it as a 2-D
//! `.npy` array.

pub mod config;
pub mod crop;
pub mod error;
mod extractor;
pub mod writer;

// Re-exports
pub use config::{default_variables, find_variable, VariableSpec};
pub use crop::crop_to_region;
pub use error::{ExtractError, Result};
pub use extractor::{artifact_file_name, ExtractedArtifact, VariableExtractor};
pub use writer::{read_npy, write_npy};
