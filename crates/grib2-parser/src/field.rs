//! Decoded grid values with their coordinate axes.

use ndarray::Array2;

use crate::error::{Grib2Error, Grib2Result};

/// One decoded record on a regular latitude/longitude grid.
///
/// `values` is indexed `[row, col]`; `lats` has one entry per row and `lons`
/// one entry per column, both in the order the file scans them.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedField {
    pub values: Array2<f32>,
    pub lats: Vec<f64>,
    pub lons: Vec<f64>,
}

impl DecodedField {
    pub fn new(values: Array2<f32>, lats: Vec<f64>, lons: Vec<f64>) -> Grib2Result<Self> {
        let (rows, cols) = values.dim();
        if lats.len() != rows {
            return Err(Grib2Error::ShapeMismatch {
                expected: rows,
                actual: lats.len(),
            });
        }
        if lons.len() != cols {
            return Err(Grib2Error::ShapeMismatch {
                expected: cols,
                actual: lons.len(),
            });
        }

        Ok(Self { values, lats, lons })
    }

    /// Build a field from values and grid points in scan order, with `ni`
    /// points along each row (i consecutive).
    pub fn from_scan(
        ni: usize,
        nj: usize,
        values: Vec<f32>,
        points: &[(f32, f32)],
    ) -> Grib2Result<Self> {
        let expected = ni * nj;
        if values.len() != expected {
            return Err(Grib2Error::ShapeMismatch {
                expected,
                actual: values.len(),
            });
        }
        if points.len() != expected {
            return Err(Grib2Error::ShapeMismatch {
                expected,
                actual: points.len(),
            });
        }

        let lats = (0..nj).map(|row| points[row * ni].0 as f64).collect();
        let lons = points[..ni].iter().map(|&(_, lon)| lon as f64).collect();
        let values = Array2::from_shape_vec((nj, ni), values)
            .map_err(|e| Grib2Error::UnsupportedGrid(e.to_string()))?;

        Self::new(values, lats, lons)
    }

    pub fn rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn cols(&self) -> usize {
        self.values.ncols()
    }
}
