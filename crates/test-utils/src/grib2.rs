//! Synthetic GRIB2 messages.
//!
//! Builds small but structurally valid GRIB2 messages (regular lat/lon grid,
//! template 4.0 product, simple packing) that the `grib` crate can decode.
//! Several messages written back to back form a multi-record file like the
//! GFS pgrb2 products.

use std::io;
use std::path::Path;

use crate::fixtures::grid::GridSpec;

/// Build a minimal GRIB2 message with the specified parameters
#[derive(Debug, Clone)]
pub struct Grib2Builder {
    discipline: u8,
    center: u16,
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    // Grid definition
    ni: u32,  // columns
    nj: u32,  // rows
    la1: i32, // first lat (microdegrees)
    lo1: i32, // first lon (microdegrees)
    la2: i32, // last lat (microdegrees)
    lo2: i32, // last lon (microdegrees)
    di: u32,  // lon increment (microdegrees)
    dj: u32,  // lat increment (microdegrees)
    // Product definition
    param_category: u8,
    param_number: u8,
    level_type: u8,
    level_value: u32,
    forecast_hour: u32,
    // Data
    data_values: Vec<f32>,
}

impl Grib2Builder {
    /// GFS-like 2 m temperature on a 10x10 one-degree grid over the western US.
    pub fn new_gfs() -> Self {
        let ni = 10;
        let nj = 10;
        Self {
            discipline: 0, // Meteorological
            center: 7,     // NCEP
            year: 2024,
            month: 3,
            day: 1,
            hour: 0,
            ni,
            nj,
            la1: 45_000_000,  // 45.0N
            lo1: 230_000_000, // 230.0E
            la2: 36_000_000,  // 36.0N
            lo2: 239_000_000, // 239.0E
            di: 1_000_000,
            dj: 1_000_000,
            param_category: 0,
            param_number: 0, // TMP
            level_type: 103, // m above ground
            level_value: 2,
            forecast_hour: 0,
            data_values: vec![288.15; (ni * nj) as usize],
        }
    }

    /// Place the grid on `spec`, scanned north to south and west to east.
    /// Resets the data to zeros.
    pub fn with_grid_spec(mut self, spec: &GridSpec) -> Self {
        self.ni = spec.ni as u32;
        self.nj = spec.nj as u32;
        self.la1 = to_micro(spec.lat_first);
        self.lo1 = to_micro(spec.lon_first);
        self.la2 = to_micro(spec.lat_last());
        self.lo2 = to_micro(spec.lon_last());
        self.di = to_micro(spec.step) as u32;
        self.dj = to_micro(spec.step) as u32;
        self.data_values = vec![0.0; spec.size()];
        self
    }

    pub fn with_parameter(mut self, category: u8, number: u8) -> Self {
        self.param_category = category;
        self.param_number = number;
        self
    }

    pub fn with_level(mut self, level_type: u8, level_value: u32) -> Self {
        self.level_type = level_type;
        self.level_value = level_value;
        self
    }

    pub fn with_forecast_hour(mut self, hour: u32) -> Self {
        self.forecast_hour = hour;
        self
    }

    pub fn with_constant_value(mut self, value: f32) -> Self {
        self.data_values = vec![value; (self.ni * self.nj) as usize];
        self
    }

    pub fn with_gradient(mut self, min_val: f32, max_val: f32) -> Self {
        let n = (self.ni * self.nj) as usize;
        self.data_values = (0..n)
            .map(|i| min_val + (max_val - min_val) * (i as f32 / n as f32))
            .collect();
        self
    }

    pub fn with_data(mut self, data: Vec<f32>) -> Self {
        self.data_values = data;
        self
    }

    /// Build the complete GRIB2 message bytes
    pub fn build(&self) -> Vec<u8> {
        let mut message = Vec::new();

        let section1 = self.build_section1();
        let section3 = self.build_section3();
        let section4 = self.build_section4();
        let section5 = self.build_section5();
        let section6 = self.build_section6();
        let section7 = self.build_section7();

        let message_length = 16 // Section 0
            + section1.len()
            + section3.len()
            + section4.len()
            + section5.len()
            + section6.len()
            + section7.len()
            + 4; // Section 8

        // Section 0: Indicator
        message.extend_from_slice(b"GRIB");
        message.extend_from_slice(&[0, 0]); // Reserved
        message.push(self.discipline);
        message.push(2); // Edition 2
        message.extend_from_slice(&(message_length as u64).to_be_bytes());

        message.extend_from_slice(&section1);
        message.extend_from_slice(&section3);
        message.extend_from_slice(&section4);
        message.extend_from_slice(&section5);
        message.extend_from_slice(&section6);
        message.extend_from_slice(&section7);

        // Section 8: End
        message.extend_from_slice(b"7777");

        message
    }

    fn build_section1(&self) -> Vec<u8> {
        let mut section = Vec::new();
        let section_length: u32 = 21;

        section.extend_from_slice(&section_length.to_be_bytes());
        section.push(1);

        section.extend_from_slice(&self.center.to_be_bytes());
        section.extend_from_slice(&0u16.to_be_bytes()); // Sub-center
        section.push(2); // Master table version
        section.push(1); // Local table version
        section.push(1); // Significance of reference time (start of forecast)

        section.extend_from_slice(&self.year.to_be_bytes());
        section.push(self.month);
        section.push(self.day);
        section.push(self.hour);
        section.push(0); // Minute
        section.push(0); // Second

        section.push(0); // Production status (operational)
        section.push(1); // Type of data (forecast)

        section
    }

    fn build_section3(&self) -> Vec<u8> {
        let mut section = Vec::new();

        // Template 3.0: Latitude/Longitude
        let template_data_len = 58;
        let section_length: u32 = 14 + template_data_len;

        section.extend_from_slice(&section_length.to_be_bytes());
        section.push(3);

        section.push(0); // Source of grid definition
        section.extend_from_slice(&(self.ni * self.nj).to_be_bytes());
        section.push(0); // Number of octets for optional list
        section.push(0); // Interpretation of optional list
        section.extend_from_slice(&0u16.to_be_bytes()); // Template 3.0

        section.push(6); // Shape of Earth (spherical with radius 6371229m)
        section.push(0);
        section.extend_from_slice(&0u32.to_be_bytes());
        section.push(0);
        section.extend_from_slice(&0u32.to_be_bytes());
        section.push(0);
        section.extend_from_slice(&0u32.to_be_bytes());

        section.extend_from_slice(&self.ni.to_be_bytes());
        section.extend_from_slice(&self.nj.to_be_bytes());
        section.extend_from_slice(&0u32.to_be_bytes()); // Basic angle
        section.extend_from_slice(&0xFFFFFFFFu32.to_be_bytes()); // Subdivisions

        section.extend_from_slice(&sign_magnitude_i32(self.la1));
        section.extend_from_slice(&sign_magnitude_i32(self.lo1));
        section.push(48); // i and j increments given
        section.extend_from_slice(&sign_magnitude_i32(self.la2));
        section.extend_from_slice(&sign_magnitude_i32(self.lo2));
        section.extend_from_slice(&self.di.to_be_bytes());
        section.extend_from_slice(&self.dj.to_be_bytes());
        section.push(0); // Scanning mode: +i, -j, i consecutive

        section
    }

    fn build_section4(&self) -> Vec<u8> {
        let mut section = Vec::new();

        // Template 4.0: Analysis or forecast at horizontal level
        let section_length: u32 = 34;

        section.extend_from_slice(&section_length.to_be_bytes());
        section.push(4);

        section.extend_from_slice(&0u16.to_be_bytes()); // Number of coordinate values
        section.extend_from_slice(&0u16.to_be_bytes()); // Template 4.0

        section.push(self.param_category);
        section.push(self.param_number);
        section.push(2); // Type of generating process (forecast)
        section.push(0); // Background generating process
        section.push(96); // Analysis or forecast process (GFS)
        section.extend_from_slice(&0u16.to_be_bytes()); // Hours of cutoff
        section.push(0); // Minutes of cutoff
        section.push(1); // Time range unit (hours)
        section.extend_from_slice(&self.forecast_hour.to_be_bytes());

        section.push(self.level_type);
        section.push(0); // Scale factor
        section.extend_from_slice(&self.level_value.to_be_bytes());

        section.push(255); // Second fixed surface: none
        section.push(0);
        section.extend_from_slice(&0u32.to_be_bytes());

        section
    }

    fn build_section5(&self) -> Vec<u8> {
        let mut section = Vec::new();
        let packing = Packing::for_values(&self.data_values);

        let section_length: u32 = 21;
        section.extend_from_slice(&section_length.to_be_bytes());
        section.push(5);

        section.extend_from_slice(&(self.ni * self.nj).to_be_bytes());
        section.extend_from_slice(&0u16.to_be_bytes()); // Template 5.0: simple packing

        section.extend_from_slice(&packing.reference_value.to_be_bytes());
        section.extend_from_slice(&sign_magnitude_i16(packing.binary_scale_factor));
        section.extend_from_slice(&0u16.to_be_bytes()); // Decimal scale factor
        section.push(packing.bits_per_value);
        section.push(0); // Original field type (floating point)

        section
    }

    fn build_section6(&self) -> Vec<u8> {
        let mut section = Vec::new();
        let section_length: u32 = 6;

        section.extend_from_slice(&section_length.to_be_bytes());
        section.push(6);
        section.push(255); // No bitmap

        section
    }

    fn build_section7(&self) -> Vec<u8> {
        let mut section = Vec::new();
        let packed_data = Packing::for_values(&self.data_values).pack(&self.data_values);

        let section_length: u32 = 5 + packed_data.len() as u32;
        section.extend_from_slice(&section_length.to_be_bytes());
        section.push(7);
        section.extend_from_slice(&packed_data);

        section
    }
}

/// Write `messages` back to back into a single file.
pub fn write_grib2_file(path: &Path, messages: &[Grib2Builder]) -> io::Result<()> {
    let bytes: Vec<u8> = messages.iter().flat_map(|m| m.build()).collect();
    std::fs::write(path, bytes)
}

/// Simple packing parameters: value = reference_value + packed * 2^E
struct Packing {
    reference_value: f32,
    binary_scale_factor: i16,
    bits_per_value: u8,
}

impl Packing {
    fn for_values(values: &[f32]) -> Self {
        let (min_val, max_val) = values.iter().fold(
            (f32::INFINITY, f32::NEG_INFINITY),
            |(min, max), &v| (min.min(v), max.max(v)),
        );
        let min_val = if min_val.is_finite() { min_val } else { 0.0 };
        let range = max_val - min_val;

        if !(range > 0.0) {
            return Self {
                reference_value: min_val,
                binary_scale_factor: 0,
                bits_per_value: 0,
            };
        }

        // 16-bit packing: range = 65535 * 2^E
        Self {
            reference_value: min_val,
            binary_scale_factor: (range / 65535.0).log2().ceil() as i16,
            bits_per_value: 16,
        }
    }

    fn pack(&self, values: &[f32]) -> Vec<u8> {
        if self.bits_per_value == 0 {
            return Vec::new();
        }

        let binary_scale = 2.0_f32.powi(self.binary_scale_factor as i32);
        values
            .iter()
            .flat_map(|&val| {
                (((val - self.reference_value) / binary_scale).round() as u16).to_be_bytes()
            })
            .collect()
    }
}

fn to_micro(degrees: f64) -> i32 {
    (degrees * 1_000_000.0).round() as i32
}

/// GRIB2 encodes signed integers as sign bit plus magnitude.
fn sign_magnitude_i32(value: i32) -> [u8; 4] {
    let magnitude = value.unsigned_abs() & 0x7FFF_FFFF;
    let sign = if value < 0 { 0x8000_0000 } else { 0 };
    (sign | magnitude).to_be_bytes()
}

fn sign_magnitude_i16(value: i16) -> [u8; 2] {
    let magnitude = value.unsigned_abs() & 0x7FFF;
    let sign = if value < 0 { 0x8000 } else { 0 };
    (sign | magnitude).to_be_bytes()
}
