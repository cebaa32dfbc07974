//! Run configuration loaded from a JSON file.
//!
//! The file names a date range, the model runs and the resolution to fetch,
//! and whether outputs are cropped to North America and the downloaded GRIB2
//! files removed afterwards.

use std::path::Path;
use std::time::Duration;

use chrono::NaiveDate;
use gfs_common::{
    date_range, parse_date, CycleParseError, ForecastCycle, ForecastHours, RegionBounds,
    Resolution, ZuluHour,
};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Errors in the configuration file. All of them are fatal.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid date '{0}', expected YYYYMMDD")]
    InvalidDate(String),

    #[error("Invalid zulu hours '{0}', expected a comma-separated list of 00, 06, 12, 18")]
    InvalidZulu(String),

    #[error("Unsupported resolution '{0}', expected one of 0p25, 0p50, 1p00")]
    UnsupportedResolution(String),

    #[error("start_date {start} is after end_date {end}")]
    DateOrder { start: NaiveDate, end: NaiveDate },

    #[error("Invalid forecast hours: start={start}, end={end}, step={step}")]
    InvalidForecastHours { start: u32, end: u32, step: u32 },

    #[error("{0} must be greater than zero")]
    InvalidTimeout(&'static str),
}

impl From<CycleParseError> for ConfigError {
    fn from(err: CycleParseError) -> Self {
        match err {
            CycleParseError::InvalidDate(s) => ConfigError::InvalidDate(s),
            CycleParseError::InvalidZulu(s) => ConfigError::InvalidZulu(s),
            CycleParseError::UnsupportedResolution(s) => ConfigError::UnsupportedResolution(s),
            CycleParseError::InvalidForecastHours { start, end, step } => {
                ConfigError::InvalidForecastHours { start, end, step }
            }
        }
    }
}

/// The configuration file as written on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    /// First date to fetch, YYYYMMDD
    pub start_date: String,
    /// Last date to fetch (inclusive), YYYYMMDD
    pub end_date: String,
    /// Comma-separated model runs, e.g. "00,12"
    #[serde(default = "default_zulus")]
    pub zulus: String,
    #[serde(default = "default_resolution")]
    pub resolution: String,
    /// Crop every output to North America
    #[serde(default = "default_true")]
    pub na_bounds: bool,
    /// Delete each GRIB2 file once its variables are written
    #[serde(default = "default_true")]
    pub cleanup: bool,
    #[serde(default)]
    pub forecast_hours: ForecastHours,
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_extract_timeout")]
    pub extract_timeout_secs: u64,
    #[serde(default)]
    pub source: SourceConfig,
}

fn default_zulus() -> String {
    "00,06,12,18".to_string()
}

fn default_resolution() -> String {
    "1p00".to_string()
}

fn default_true() -> bool {
    true
}

fn default_fetch_timeout() -> u64 {
    600
}

fn default_extract_timeout() -> u64 {
    1800
}

/// Where GRIB2 files are fetched from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// Base URL; defaults to the bucket's public S3 endpoint
    #[serde(default)]
    pub endpoint: Option<String>,
}

fn default_bucket() -> String {
    "noaa-gfs-bdp-pds".to_string()
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            endpoint: None,
        }
    }
}

impl SourceConfig {
    pub fn endpoint(&self) -> String {
        self.endpoint
            .clone()
            .unwrap_or_else(|| format!("https://{}.s3.amazonaws.com", self.bucket))
    }
}

/// Validated, immutable settings for one run.
#[derive(Debug, Clone)]
pub struct RunConfiguration {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub zulu_hours: Vec<ZuluHour>,
    pub resolution: Resolution,
    pub crop_to_region: bool,
    pub cleanup_after_extract: bool,
    pub forecast_hours: Vec<u32>,
    pub fetch_timeout: Duration,
    pub extract_deadline: Duration,
    pub source: SourceConfig,
}

impl RunConfiguration {
    /// Load and validate a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let config = Self::from_json(&content)?;
        debug!(path = %path.display(), "Loaded run configuration");
        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = serde_json::from_str(content)?;
        Self::try_from(file)
    }

    /// Every cycle of the run: dates, then zulu hours, then forecast hours.
    pub fn cycles(&self) -> Vec<ForecastCycle> {
        let mut cycles = Vec::new();
        for date in date_range(self.start_date, self.end_date) {
            for &zulu in &self.zulu_hours {
                for &hour in &self.forecast_hours {
                    cycles.push(ForecastCycle::new(date, zulu, hour, self.resolution));
                }
            }
        }
        cycles
    }

    /// Crop region, if cropping is enabled.
    pub fn region(&self) -> Option<RegionBounds> {
        self.crop_to_region.then_some(RegionBounds::NORTH_AMERICA)
    }

    /// Log file name for this run, e.g. `grib_20240301_to_20240302.log`.
    pub fn log_file_name(&self) -> String {
        format!(
            "grib_{}_to_{}.log",
            self.start_date.format("%Y%m%d"),
            self.end_date.format("%Y%m%d")
        )
    }
}

impl TryFrom<ConfigFile> for RunConfiguration {
    type Error = ConfigError;

    fn try_from(file: ConfigFile) -> Result<Self, Self::Error> {
        let start_date = parse_date(&file.start_date)?;
        let end_date = parse_date(&file.end_date)?;
        if start_date > end_date {
            return Err(ConfigError::DateOrder {
                start: start_date,
                end: end_date,
            });
        }

        let zulu_hours = ZuluHour::parse_list(&file.zulus)?;
        let resolution: Resolution = file.resolution.trim().parse()?;

        file.forecast_hours.validate()?;

        if file.fetch_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout("fetch_timeout_secs"));
        }
        if file.extract_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout("extract_timeout_secs"));
        }

        Ok(Self {
            start_date,
            end_date,
            zulu_hours,
            resolution,
            crop_to_region: file.na_bounds,
            cleanup_after_extract: file.cleanup,
            forecast_hours: file.forecast_hours.hours(),
            fetch_timeout: Duration::from_secs(file.fetch_timeout_secs),
            extract_deadline: Duration::from_secs(file.extract_timeout_secs),
            source: file.source,
        })
    }
}
