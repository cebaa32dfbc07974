//! Coordinate-based cropping of decoded fields.

use gfs_common::RegionBounds;
use grib2_parser::DecodedField;
use ndarray::s;

use crate::error::{ExtractError, Result};

/// Crop `field` to the rows and columns whose coordinates fall inside `bounds`.
///
/// The result is the contiguous index rectangle spanning the first through
/// the last matching row and column, so for monotonic axes cropping twice
/// gives the same grid as cropping once. Longitudes are normalized to
/// [0, 360) before comparison.
pub fn crop_to_region(field: &DecodedField, bounds: &RegionBounds) -> Result<DecodedField> {
    let rows = index_span(field.lats.iter().map(|&lat| bounds.contains_lat(lat)));
    let cols = index_span(field.lons.iter().map(|&lon| bounds.contains_lon(lon)));

    let ((r0, r1), (c0, c1)) = match (rows, cols) {
        (Some(rows), Some(cols)) => (rows, cols),
        _ => {
            return Err(ExtractError::CropOutOfRange {
                lat_min: bounds.lat_min,
                lat_max: bounds.lat_max,
                lon_min: bounds.lon_min,
                lon_max: bounds.lon_max,
            })
        }
    };

    Ok(DecodedField {
        values: field.values.slice(s![r0..=r1, c0..=c1]).to_owned(),
        lats: field.lats[r0..=r1].to_vec(),
        lons: field.lons[c0..=c1].to_vec(),
    })
}

/// First and last index for which `selected` yields true.
fn index_span(selected: impl Iterator<Item = bool>) -> Option<(usize, usize)> {
    selected
        .enumerate()
        .filter(|&(_, inside)| inside)
        .fold(None, |span, (i, _)| match span {
            None => Some((i, i)),
            Some((first, _)) => Some((first, i)),
        })
}
