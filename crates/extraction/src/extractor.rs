//! Extract one catalogued variable from a decoded GRIB2 file.

use std::path::{Path, PathBuf};

use gfs_common::{ForecastCycle, RegionBounds};
use grib2_parser::{DecodedFile, Grib2Tables};
use ndarray::Array2;
use tracing::{debug, info};

use crate::config::VariableSpec;
use crate::crop::crop_to_region;
use crate::error::{ExtractError, Result};
use crate::writer::write_npy;

/// One variable persisted to disk.
#[derive(Debug, Clone)]
pub struct ExtractedArtifact {
    pub variable: String,
    pub path: PathBuf,
    pub grid: Array2<f32>,
}

/// Pulls variables out of decoded files and writes them as `.npy` arrays.
///
/// Holds no per-file state, so one extractor serves every worker of a cycle.
pub struct VariableExtractor {
    tables: Grib2Tables,
}

impl VariableExtractor {
    pub fn new() -> Self {
        Self {
            tables: Grib2Tables::gfs(),
        }
    }

    /// Decode `spec` from `file`, crop it to `bounds` if given and write it
    /// to `output_path`.
    ///
    /// The file at `output_path` is complete and closed when this returns.
    pub fn extract(
        &self,
        file: &dyn DecodedFile,
        spec: &VariableSpec,
        bounds: Option<&RegionBounds>,
        output_path: &Path,
    ) -> Result<ExtractedArtifact> {
        let field = file
            .read_field(&spec.selector)?
            .ok_or_else(|| ExtractError::VariableNotFound(spec.canonical_name.to_string()))?;

        debug!(
            variable = spec.canonical_name,
            record = %spec.selector.describe(&self.tables),
            rows = field.rows(),
            cols = field.cols(),
            "Decoded variable"
        );

        let field = match bounds {
            Some(bounds) => crop_to_region(&field, bounds)?,
            None => field,
        };

        write_npy(output_path, &field.values)?;

        info!(
            variable = spec.canonical_name,
            path = %output_path.display(),
            rows = field.rows(),
            cols = field.cols(),
            "Extracted variable"
        );

        Ok(ExtractedArtifact {
            variable: spec.canonical_name.to_string(),
            path: output_path.to_path_buf(),
            grid: field.values,
        })
    }
}

impl Default for VariableExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Output file name for one variable of one cycle, e.g.
/// `gfs_20240301_t00z_1p00_f000_2t.npy`.
pub fn artifact_file_name(cycle: &ForecastCycle, variable: &str) -> String {
    format!("gfs_{}_{}.npy", cycle.label(), variable)
}
