//! Mapping from forecast cycles to remote object keys.

use std::fmt;

use gfs_common::ForecastCycle;

use crate::config::SourceConfig;

/// Key of one GRIB2 object in the bucket,
/// e.g. `gfs.20240301/00/atmos/gfs.t00z.pgrb2.1p00.f000`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteObjectKey(String);

impl RemoteObjectKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemoteObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Layout of the public GFS bucket.
#[derive(Debug, Clone)]
pub struct RemoteCatalog {
    bucket: String,
    endpoint: String,
}

impl RemoteCatalog {
    pub fn new(source: &SourceConfig) -> Self {
        Self {
            bucket: source.bucket.clone(),
            endpoint: source.endpoint().trim_end_matches('/').to_string(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Object key for `cycle`.
    pub fn resolve(&self, cycle: &ForecastCycle) -> RemoteObjectKey {
        RemoteObjectKey(format!(
            "gfs.{}/{}/atmos/{}",
            cycle.date_token(),
            cycle.zulu.token(),
            Self::file_name(cycle)
        ))
    }

    /// Download URL for `key`.
    pub fn url(&self, key: &RemoteObjectKey) -> String {
        format!("{}/{}", self.endpoint, key)
    }

    /// Name of the object within its directory, also used for the local copy.
    pub fn file_name(cycle: &ForecastCycle) -> String {
        format!(
            "gfs.t{}z.pgrb2.{}.{}",
            cycle.zulu.token(),
            cycle.resolution,
            cycle.forecast_token()
        )
    }
}
