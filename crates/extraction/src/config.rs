//! The catalog of variables extracted from every GFS file.

use grib2_parser::level_types::*;
use grib2_parser::FieldSelector;

/// Specification for a variable to extract.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableSpec {
    /// Short name used in output file names (e.g., "2t", "gh500")
    pub canonical_name: &'static str,
    pub description: &'static str,
    /// Record holding the variable
    pub selector: FieldSelector,
}

/// The fixed set of variables pulled from each file.
pub fn default_variables() -> Vec<VariableSpec> {
    vec![
        VariableSpec {
            canonical_name: "2t",
            description: "Temperature 2 m above ground",
            selector: FieldSelector::meteorological(0, 0, HEIGHT_ABOVE_GROUND).at_value(2.0),
        },
        VariableSpec {
            canonical_name: "sp",
            description: "Surface pressure",
            selector: FieldSelector::meteorological(3, 0, SURFACE),
        },
        VariableSpec {
            canonical_name: "gh200",
            description: "Geopotential height at 200 hPa",
            selector: FieldSelector::isobaric_hpa(3, 5, 200.0),
        },
        VariableSpec {
            canonical_name: "gh500",
            description: "Geopotential height at 500 hPa",
            selector: FieldSelector::isobaric_hpa(3, 5, 500.0),
        },
        VariableSpec {
            canonical_name: "gh700",
            description: "Geopotential height at 700 hPa",
            selector: FieldSelector::isobaric_hpa(3, 5, 700.0),
        },
    ]
}

/// Look up a catalogued variable by canonical name.
pub fn find_variable(name: &str) -> Option<VariableSpec> {
    default_variables()
        .into_iter()
        .find(|spec| spec.canonical_name == name)
}
