//! Common test fixtures for the GFS extraction tests.
//!
//! Pre-defined values that represent common scenarios in GFS processing.

/// Region bounds as (lat_min, lat_max, lon_min, lon_max), longitudes 0..360.
pub mod region {
    /// Southern Mexico to northern Canada
    pub const NORTH_AMERICA: (f64, f64, f64, f64) = (15.0, 60.0, 220.0, 305.0);

    /// Whole globe
    pub const GLOBAL: (f64, f64, f64, f64) = (-90.0, 90.0, 0.0, 360.0);

    /// Southern hemisphere Indian Ocean, outside any North American grid
    pub const INDIAN_OCEAN: (f64, f64, f64, f64) = (-40.0, -10.0, 60.0, 100.0);
}

/// Common grid specifications for testing.
pub mod grid {
    /// GFS global grid at 1.00 degree, scanned north to south
    pub const GFS_1P00: GridSpec = GridSpec {
        ni: 360,
        nj: 181,
        lat_first: 90.0,
        lon_first: 0.0,
        step: 1.0,
    };

    /// GFS global grid at 0.25 degree
    pub const GFS_0P25: GridSpec = GridSpec {
        ni: 1440,
        nj: 721,
        lat_first: 90.0,
        lon_first: 0.0,
        step: 0.25,
    };

    /// Coarse grid around North America with points on half degrees, so that
    /// no point sits exactly on a region edge.
    pub const NA_HALF_DEGREE: GridSpec = GridSpec {
        ni: 121,
        nj: 66,
        lat_first: 70.5,
        lon_first: 200.5,
        step: 1.0,
    };

    /// Regular latitude/longitude grid, first point in the north-west corner.
    #[derive(Debug, Clone, Copy)]
    pub struct GridSpec {
        pub ni: usize,
        pub nj: usize,
        pub lat_first: f64,
        pub lon_first: f64,
        pub step: f64,
    }

    impl GridSpec {
        /// Returns the total number of grid points.
        pub fn size(&self) -> usize {
            self.ni * self.nj
        }

        pub fn lat_last(&self) -> f64 {
            self.lat_first - self.step * (self.nj - 1) as f64
        }

        pub fn lon_last(&self) -> f64 {
            self.lon_first + self.step * (self.ni - 1) as f64
        }
    }
}

/// Canonical names of the extracted variables.
pub mod variables {
    pub const ALL: [&str; 5] = ["2t", "sp", "gh200", "gh500", "gh700"];
}
