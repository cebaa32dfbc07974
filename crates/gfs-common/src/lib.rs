//! Common types shared by the GFS extraction crates and the downloader service.

pub mod bbox;
pub mod cycle;
pub mod error;

pub use bbox::RegionBounds;
pub use cycle::{date_range, parse_date, ForecastCycle, ForecastHours, Resolution, ZuluHour};
pub use error::CycleParseError;
