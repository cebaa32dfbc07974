//! GRIB2 parameter and level lookup tables.
//!
//! Translates numeric codes into the short names and level descriptions used
//! in log lines and error messages.

use std::collections::HashMap;

/// GRIB2 fixed surface type codes (code table 4.5).
pub mod level_types {
    /// Ground or water surface
    pub const SURFACE: u8 = 1;
    /// Isobaric surface, value in Pa
    pub const ISOBARIC: u8 = 100;
    /// Specified height above ground, value in m
    pub const HEIGHT_ABOVE_GROUND: u8 = 103;
}

/// Lookup key for parameter: (discipline, category, number)
pub type ParamKey = (u8, u8, u8);

/// Level description - either static text or a template with {value} placeholder
#[derive(Debug, Clone)]
pub enum LevelDescription {
    /// Static description (e.g., "surface", "mean sea level")
    Static(String),
    /// Template with placeholders (e.g., "{value_mb} mb", "{value} m above ground")
    Template(String),
}

impl LevelDescription {
    /// Format the level description, substituting placeholders if it's a template.
    ///
    /// Supported placeholders:
    /// - `{value}` - Raw level value (e.g., 50000 for 500 mb in Pa)
    /// - `{value_mb}` - Value converted from Pa to mb (divided by 100)
    pub fn format(&self, value: f64) -> String {
        match self {
            LevelDescription::Static(s) => s.clone(),
            LevelDescription::Template(t) => t
                .replace("{value_mb}", &(value / 100.0).to_string())
                .replace("{value}", &value.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Grib2Tables {
    /// (discipline, category, number) -> parameter short name (e.g., "TMP", "HGT")
    parameters: HashMap<ParamKey, String>,
    /// level_type -> description pattern
    levels: HashMap<u8, LevelDescription>,
}

impl Grib2Tables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names for the GFS pgrb2 records the extractor reads.
    pub fn gfs() -> Self {
        use level_types::*;

        let mut tables = Self::new();
        for (category, number, name) in [(0, 0, "TMP"), (3, 0, "PRES"), (3, 5, "HGT")] {
            tables.add_parameter(0, category, number, name.to_string());
        }

        tables.add_level(SURFACE, LevelDescription::Static("surface".to_string()));
        tables.add_level(
            ISOBARIC,
            LevelDescription::Template("{value_mb} mb".to_string()),
        );
        tables.add_level(
            HEIGHT_ABOVE_GROUND,
            LevelDescription::Template("{value} m above ground".to_string()),
        );
        tables
    }

    pub fn add_parameter(&mut self, discipline: u8, category: u8, number: u8, name: String) {
        self.parameters.insert((discipline, category, number), name);
    }

    pub fn add_level(&mut self, level_type: u8, description: LevelDescription) {
        self.levels.insert(level_type, description);
    }

    /// Look up parameter short name by GRIB2 codes.
    ///
    /// Returns "P{discipline}_{category}_{number}" if not found.
    pub fn get_parameter_name(&self, discipline: u8, category: u8, number: u8) -> String {
        self.parameters
            .get(&(discipline, category, number))
            .cloned()
            .unwrap_or_else(|| format!("P{}_{}_{}", discipline, category, number))
    }

    /// Look up level description by type code and value.
    ///
    /// Returns "Level type {type} value {value}" if not found.
    pub fn get_level_description(&self, level_type: u8, level_value: f64) -> String {
        match self.levels.get(&level_type) {
            Some(desc) => desc.format(level_value),
            None => format!("Level type {} value {}", level_type, level_value),
        }
    }
}
