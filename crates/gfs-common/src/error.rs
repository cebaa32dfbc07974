//! Parse errors for cycle components.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CycleParseError {
    #[error("Invalid date '{0}', expected YYYYMMDD")]
    InvalidDate(String),

    #[error("Invalid zulu hour '{0}', expected a comma-separated list of 00, 06, 12, 18")]
    InvalidZulu(String),

    #[error("Unsupported resolution '{0}', expected one of 0p25, 0p50, 1p00")]
    UnsupportedResolution(String),

    #[error("Invalid forecast hours: start={start}, end={end}, step={step}")]
    InvalidForecastHours { start: u32, end: u32, step: u32 },
}
