//! GFS GRIB2 downloader and extractor.
//!
//! For every (date, zulu hour, forecast hour) of a run, fetches one GRIB2
//! file from the NOAA GFS bucket, extracts a fixed set of variables into
//! `.npy` arrays, and deletes the GRIB2 file.

pub mod catalog;
pub mod config;
pub mod download;
pub mod logging;
pub mod runner;

pub use catalog::{RemoteCatalog, RemoteObjectKey};
pub use config::{ConfigError, RunConfiguration, SourceConfig};
pub use download::{FetchError, Fetcher, HttpFetcher, MirrorFetcher};
pub use logging::RuntimeLogger;
pub use runner::{CleanupError, CycleReport, CycleState, RunSummary, Runner, VariableFailure};
