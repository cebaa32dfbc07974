//! Model cycle identification: dates, zulu hours, resolutions, forecast hours.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::CycleParseError;

/// UTC initialization hour of a GFS run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ZuluHour {
    /// 00Z run
    Z00,
    /// 06Z run
    Z06,
    /// 12Z run
    Z12,
    /// 18Z run
    Z18,
}

impl ZuluHour {
    /// Two-digit token as used in remote keys ("00", "06", ...).
    pub fn token(&self) -> &'static str {
        match self {
            ZuluHour::Z00 => "00",
            ZuluHour::Z06 => "06",
            ZuluHour::Z12 => "12",
            ZuluHour::Z18 => "18",
        }
    }

    /// Parse a comma-separated list such as "00,12".
    ///
    /// Order is preserved and duplicates are dropped.
    pub fn parse_list(s: &str) -> Result<Vec<ZuluHour>, CycleParseError> {
        let mut hours = Vec::new();
        for token in s.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let hour: ZuluHour = token.parse()?;
            if !hours.contains(&hour) {
                hours.push(hour);
            }
        }

        if hours.is_empty() {
            return Err(CycleParseError::InvalidZulu(s.to_string()));
        }
        Ok(hours)
    }
}

impl FromStr for ZuluHour {
    type Err = CycleParseError;

    /// Accepts exactly the two-digit tokens "00", "06", "12" and "18".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "00" => Ok(ZuluHour::Z00),
            "06" => Ok(ZuluHour::Z06),
            "12" => Ok(ZuluHour::Z12),
            "18" => Ok(ZuluHour::Z18),
            _ => Err(CycleParseError::InvalidZulu(s.to_string())),
        }
    }
}

impl fmt::Display for ZuluHour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}z", self.token())
    }
}

/// Grid spacing published in the GFS pgrb2 product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resolution {
    /// 0.25 degree
    P0p25,
    /// 0.50 degree
    P0p50,
    /// 1.00 degree
    P1p00,
}

impl Resolution {
    pub fn token(&self) -> &'static str {
        match self {
            Resolution::P0p25 => "0p25",
            Resolution::P0p50 => "0p50",
            Resolution::P1p00 => "1p00",
        }
    }
}

impl FromStr for Resolution {
    type Err = CycleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "0p25" => Ok(Resolution::P0p25),
            "0p50" => Ok(Resolution::P0p50),
            "1p00" => Ok(Resolution::P1p00),
            _ => Err(CycleParseError::UnsupportedResolution(s.to_string())),
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Inclusive forecast hour range with a fixed step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ForecastHours {
    pub start: u32,
    pub end: u32,
    pub step: u32,
}

impl Default for ForecastHours {
    /// 0 through 384 every 3 hours.
    fn default() -> Self {
        Self {
            start: 0,
            end: 384,
            step: 3,
        }
    }
}

impl ForecastHours {
    pub fn validate(&self) -> Result<(), CycleParseError> {
        if self.step == 0 || self.start > self.end {
            return Err(CycleParseError::InvalidForecastHours {
                start: self.start,
                end: self.end,
                step: self.step,
            });
        }
        Ok(())
    }

    /// Generate the list of forecast hours.
    pub fn hours(&self) -> Vec<u32> {
        if self.step == 0 {
            return Vec::new();
        }
        (self.start..=self.end).step_by(self.step as usize).collect()
    }
}

/// One remote GRIB2 object: a model run and one lead time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ForecastCycle {
    pub date: NaiveDate,
    pub zulu: ZuluHour,
    pub forecast_hour: u32,
    pub resolution: Resolution,
}

impl ForecastCycle {
    pub fn new(date: NaiveDate, zulu: ZuluHour, forecast_hour: u32, resolution: Resolution) -> Self {
        Self {
            date,
            zulu,
            forecast_hour,
            resolution,
        }
    }

    /// Date as YYYYMMDD.
    pub fn date_token(&self) -> String {
        self.date.format("%Y%m%d").to_string()
    }

    /// Zero-padded forecast hour ("f006").
    pub fn forecast_token(&self) -> String {
        format!("f{:03}", self.forecast_hour)
    }

    /// Stable identifier used in log lines and output names.
    pub fn label(&self) -> String {
        format!(
            "{}_t{}z_{}_{}",
            self.date_token(),
            self.zulu.token(),
            self.resolution,
            self.forecast_token()
        )
    }
}

impl fmt::Display for ForecastCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.date.format("%Y-%m-%d"),
            self.zulu,
            self.resolution,
            self.forecast_token()
        )
    }
}

/// Parse a YYYYMMDD date.
pub fn parse_date(s: &str) -> Result<NaiveDate, CycleParseError> {
    NaiveDate::parse_from_str(s.trim(), "%Y%m%d")
        .map_err(|_| CycleParseError::InvalidDate(s.to_string()))
}

/// Every date from `start` through `end`, inclusive. Empty when start > end.
pub fn date_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start.iter_days().take_while(|d| *d <= end).collect()
}
