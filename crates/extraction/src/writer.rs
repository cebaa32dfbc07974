//! `.npy` serialization of extracted grids.
//!
//! Arrays are written as little-endian `f32` (`<f4`) in C order with shape
//! `[rows, cols]`, readable by `numpy.load`.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use ndarray::Array2;
use npyz::WriterBuilder;
use tracing::debug;

use crate::error::{ExtractError, Result};

/// Write `grid` to `path`.
///
/// The array is first written to `{path}.partial`, flushed and synced, then
/// renamed into place, so `path` never holds a truncated array.
pub fn write_npy(path: &Path, grid: &Array2<f32>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| ExtractError::write(parent, e))?;
    }

    let partial = partial_path(path);
    if let Err(e) = write_partial(&partial, grid) {
        let _ = fs::remove_file(&partial);
        return Err(ExtractError::write(path, e));
    }

    fs::rename(&partial, path).map_err(|e| ExtractError::write(path, e))?;

    debug!(
        path = %path.display(),
        rows = grid.nrows(),
        cols = grid.ncols(),
        "Wrote npy array"
    );
    Ok(())
}

fn write_partial(partial: &Path, grid: &Array2<f32>) -> io::Result<()> {
    let file = File::create(partial)?;
    let mut out = BufWriter::new(file);

    let mut writer = npyz::WriteOptions::<f32>::new()
        .default_dtype()
        .shape(&[grid.nrows() as u64, grid.ncols() as u64])
        .writer(&mut out)
        .begin_nd()?;
    // Logical iteration order is row-major regardless of memory layout
    writer.extend(grid.iter().copied())?;
    writer.finish()?;

    out.flush()?;
    let file = out.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()
}

/// Read a 2-D `f32` array written by [`write_npy`] (or numpy).
pub fn read_npy(path: &Path) -> io::Result<Array2<f32>> {
    let bytes = fs::read(path)?;
    let reader = npyz::NpyFile::new(&bytes[..])?;
    let shape = reader.shape().to_vec();
    let order = reader.order();

    let (rows, cols) = match shape.as_slice() {
        [rows, cols] => (*rows as usize, *cols as usize),
        _ => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("expected a 2-D array, got shape {:?}", shape),
            ))
        }
    };

    let data = reader.into_vec::<f32>()?;
    let array = if matches!(order, npyz::Order::Fortran) {
        Array2::from_shape_vec((cols, rows), data).map(|a| a.reversed_axes())
    } else {
        Array2::from_shape_vec((rows, cols), data)
    };
    array.map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}
