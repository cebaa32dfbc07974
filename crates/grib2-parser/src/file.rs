//! Opened GRIB2 files and the seam the extractor reads them through.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use grib::{Grib2, SeekableGrib2Reader};
use tracing::{debug, info};

use crate::error::{Grib2Error, Grib2Result};
use crate::field::DecodedField;
use crate::selector::{FieldSelector, RecordKey};

/// A GRIB2 file that can be read from several threads at once.
pub trait DecodedFile: Send + Sync {
    /// Decode the first record matching `selector`, or `None` if no record does.
    fn read_field(&self, selector: &FieldSelector) -> Grib2Result<Option<DecodedField>>;
}

/// Opens a downloaded file for decoding.
pub trait GribOpener: Send + Sync {
    fn open(&self, path: &Path) -> Grib2Result<Arc<dyn DecodedFile>>;
}

/// Opens files with [`GribFile::open`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Grib2Opener;

impl GribOpener for Grib2Opener {
    fn open(&self, path: &Path) -> Grib2Result<Arc<dyn DecodedFile>> {
        Ok(Arc::new(GribFile::open(path)?))
    }
}

type Reader = Grib2<SeekableGrib2Reader<BufReader<File>>>;

/// A GRIB2 file opened with the `grib` crate.
///
/// The reader seeks a single file handle and is not `Sync`, so it sits
/// behind a mutex. A lock is held only while one record is located and
/// decoded into owned buffers.
pub struct GribFile {
    path: PathBuf,
    reader: Mutex<Reader>,
}

impl GribFile {
    pub fn open(path: impl AsRef<Path>) -> Grib2Result<Self> {
        let path = path.as_ref().to_path_buf();
        let open_err = |message: String| Grib2Error::Open {
            path: path.display().to_string(),
            message,
        };

        let file = File::open(&path).map_err(|e| open_err(e.to_string()))?;
        let reader = grib::from_reader(BufReader::new(file)).map_err(|e| open_err(e.to_string()))?;

        info!(
            path = %path.display(),
            records = reader.iter().count(),
            "Opened GRIB2 file"
        );

        Ok(Self {
            path,
            reader: Mutex::new(reader),
        })
    }
}

impl DecodedFile for GribFile {
    fn read_field(&self, selector: &FieldSelector) -> Grib2Result<Option<DecodedField>> {
        let reader = self
            .reader
            .lock()
            .map_err(|_| Grib2Error::Poisoned(self.path.display().to_string()))?;

        for (index, submessage) in reader.iter() {
            let prod_def = submessage.prod_def();
            let first_surface = prod_def.fixed_surfaces().map(|(first, _)| first);
            let key = RecordKey {
                discipline: submessage.indicator().discipline,
                category: prod_def.parameter_category(),
                number: prod_def.parameter_number(),
                surface_type: first_surface.as_ref().map(|s| s.surface_type),
                surface_value: first_surface.as_ref().map(|s| s.value()),
            };
            if !selector.matches(&key) {
                continue;
            }

            let (ni, nj) = submessage
                .grid_shape()
                .map_err(|e| Grib2Error::UnsupportedGrid(e.to_string()))?;
            let points: Vec<(f32, f32)> = submessage
                .latlons()
                .map_err(|e| Grib2Error::UnsupportedGrid(e.to_string()))?
                .collect();

            let decoder = grib::Grib2SubmessageDecoder::from(submessage)?;
            let values: Vec<f32> = decoder.dispatch()?.collect();

            debug!(
                path = %self.path.display(),
                message = index.0,
                submessage = index.1,
                ni = ni,
                nj = nj,
                "Decoded GRIB2 record"
            );

            return DecodedField::from_scan(ni, nj, values, &points).map(Some);
        }

        Ok(None)
    }
}
