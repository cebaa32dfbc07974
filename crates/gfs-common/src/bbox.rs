//! Geographic region bounds used to crop global grids.

/// A latitude/longitude rectangle in degrees.
///
/// Longitudes use the 0..360 convention of the GFS global grids, so a box over
/// North America runs from 220 to 305 rather than -140 to -55.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionBounds {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl RegionBounds {
    /// Southern Mexico to northern Canada, Pacific to Atlantic.
    pub const NORTH_AMERICA: RegionBounds = RegionBounds {
        lat_min: 15.0,
        lat_max: 60.0,
        lon_min: 220.0,
        lon_max: 305.0,
    };

    /// Covers every point of a global grid.
    pub const GLOBAL: RegionBounds = RegionBounds {
        lat_min: -90.0,
        lat_max: 90.0,
        lon_min: 0.0,
        lon_max: 360.0,
    };

    pub fn new(lat_min: f64, lat_max: f64, lon_min: f64, lon_max: f64) -> Self {
        Self {
            lat_min,
            lat_max,
            lon_min,
            lon_max,
        }
    }

    pub fn contains_lat(&self, lat: f64) -> bool {
        lat >= self.lat_min && lat <= self.lat_max
    }

    /// Longitude test after normalizing `lon` into [0, 360).
    pub fn contains_lon(&self, lon: f64) -> bool {
        let lon = normalize_longitude(lon);
        lon >= self.lon_min && lon <= self.lon_max
    }

    pub fn contains_point(&self, lat: f64, lon: f64) -> bool {
        self.contains_lat(lat) && self.contains_lon(lon)
    }
}

/// Map any longitude into [0, 360).
pub fn normalize_longitude(lon: f64) -> f64 {
    let lon = lon.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if lon >= 360.0 {
        0.0
    } else {
        lon
    }
}
