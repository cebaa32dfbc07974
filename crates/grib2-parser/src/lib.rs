//! GRIB2 decoding for the extraction pipeline.
//!
//! Wraps the `grib` crate: opening a file, selecting one record by parameter
//! and fixed surface, and decoding it into an owned grid together with its
//! latitude and longitude axes.

pub mod error;
pub mod field;
pub mod file;
pub mod selector;
pub mod tables;

pub use error::{Grib2Error, Grib2Result};
pub use field::DecodedField;
pub use file::{DecodedFile, Grib2Opener, GribFile, GribOpener};
pub use selector::{FieldSelector, RecordKey};
pub use tables::{level_types, Grib2Tables, LevelDescription};
