//! Record selection by parameter codes and first fixed surface.

use crate::tables::{level_types, Grib2Tables};

/// Identity of one GRIB2 record as read from its sections 0 and 4.
///
/// Fields are optional because not every product definition template
/// carries a parameter or a fixed surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordKey {
    pub discipline: u8,
    pub category: Option<u8>,
    pub number: Option<u8>,
    pub surface_type: Option<u8>,
    pub surface_value: Option<f64>,
}

/// Which record to pull out of a GRIB2 file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSelector {
    pub discipline: u8,
    pub category: u8,
    pub number: u8,
    pub surface_type: u8,
    /// `None` accepts any value of `surface_type`.
    pub surface_value: Option<f64>,
}

impl FieldSelector {
    /// Meteorological (discipline 0) parameter on a surface of the given type.
    pub const fn meteorological(category: u8, number: u8, surface_type: u8) -> Self {
        Self {
            discipline: 0,
            category,
            number,
            surface_type,
            surface_value: None,
        }
    }

    pub fn at_value(mut self, value: f64) -> Self {
        self.surface_value = Some(value);
        self
    }

    /// Meteorological parameter on an isobaric surface given in hPa.
    pub fn isobaric_hpa(category: u8, number: u8, hpa: f64) -> Self {
        Self::meteorological(category, number, level_types::ISOBARIC).at_value(hpa * 100.0)
    }

    pub fn matches(&self, key: &RecordKey) -> bool {
        if key.discipline != self.discipline
            || key.category != Some(self.category)
            || key.number != Some(self.number)
            || key.surface_type != Some(self.surface_type)
        {
            return false;
        }

        match (self.surface_value, key.surface_value) {
            (None, _) => true,
            (Some(want), Some(have)) => (want - have).abs() <= 1e-3,
            (Some(_), None) => false,
        }
    }

    /// Human readable form such as "HGT @ 500 mb".
    pub fn describe(&self, tables: &Grib2Tables) -> String {
        let name = tables.get_parameter_name(self.discipline, self.category, self.number);
        let level = tables.get_level_description(self.surface_type, self.surface_value.unwrap_or(0.0));
        format!("{} @ {}", name, level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(category: u8, number: u8, surface_type: u8, value: f64) -> RecordKey {
        RecordKey {
            discipline: 0,
            category: Some(category),
            number: Some(number),
            surface_type: Some(surface_type),
            surface_value: Some(value),
        }
    }

    #[test]
    fn test_isobaric_selector_matches_only_its_level() {
        let gh500 = FieldSelector::isobaric_hpa(3, 5, 500.0);

        assert!(gh500.matches(&key(3, 5, 100, 50000.0)));
        assert!(!gh500.matches(&key(3, 5, 100, 70000.0)));
        assert!(!gh500.matches(&key(0, 0, 100, 50000.0)));
        assert!(!gh500.matches(&key(3, 5, 103, 50000.0)));
    }

    #[test]
    fn test_selector_without_value_accepts_any_value() {
        let sp = FieldSelector::meteorological(3, 0, level_types::SURFACE);

        assert!(sp.matches(&key(3, 0, 1, 0.0)));
        assert!(sp.matches(&RecordKey {
            surface_value: None,
            ..key(3, 0, 1, 0.0)
        }));
    }

    #[test]
    fn test_selector_rejects_other_disciplines_and_missing_fields() {
        let t2m = FieldSelector::meteorological(0, 0, level_types::HEIGHT_ABOVE_GROUND).at_value(2.0);

        assert!(t2m.matches(&key(0, 0, 103, 2.0)));
        assert!(!t2m.matches(&RecordKey {
            discipline: 10,
            ..key(0, 0, 103, 2.0)
        }));
        assert!(!t2m.matches(&RecordKey {
            surface_type: None,
            ..key(0, 0, 103, 2.0)
        }));
        assert!(!t2m.matches(&RecordKey {
            surface_value: None,
            ..key(0, 0, 103, 2.0)
        }));
    }

    #[test]
    fn test_describe() {
        let tables = Grib2Tables::gfs();

        assert_eq!(
            FieldSelector::isobaric_hpa(3, 5, 200.0).describe(&tables),
            "HGT @ 200 mb"
        );
        assert_eq!(
            FieldSelector::meteorological(0, 0, level_types::HEIGHT_ABOVE_GROUND)
                .at_value(2.0)
                .describe(&tables),
            "TMP @ 2 m above ground"
        );
        assert_eq!(
            FieldSelector::meteorological(3, 0, level_types::SURFACE).describe(&tables),
            "PRES @ surface"
        );
    }
}
