//! Fetching GRIB2 objects to local files.
//!
//! A fetch writes to `{destination}.partial`, flushes and syncs it, and only
//! then renames it to `destination`, so a returned path always names a
//! complete, closed file.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Response, StatusCode};
use thiserror::Error;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::catalog::{RemoteCatalog, RemoteObjectKey};

/// Why a fetch did not produce a file.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The object does not exist (not yet published, or aged out).
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Transfer failed: {0}")]
    TransferFailure(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Timed out: {0}")]
    Timeout(String),
}

impl FetchError {
    fn from_io(err: io::Error, path: &Path) -> Self {
        let message = format!("{}: {}", path.display(), err);
        match err.kind() {
            io::ErrorKind::PermissionDenied => FetchError::PermissionDenied(message),
            io::ErrorKind::TimedOut => FetchError::Timeout(message),
            _ => FetchError::TransferFailure(message),
        }
    }

    fn from_reqwest(err: reqwest::Error, url: &str) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(format!("{}: {}", url, err))
        } else {
            FetchError::TransferFailure(format!("{}: {}", url, err))
        }
    }
}

/// Source of GRIB2 files.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Copy the object at `key` to `destination`, creating parent directories.
    async fn fetch(&self, key: &RemoteObjectKey, destination: &Path) -> Result<PathBuf, FetchError>;
}

/// Downloads objects over HTTP(S) from the bucket endpoint.
pub struct HttpFetcher {
    client: Client,
    catalog: RemoteCatalog,
}

impl HttpFetcher {
    pub fn new(catalog: RemoteCatalog, request_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(4)
            .tcp_nodelay(true)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, catalog })
    }

    async fn download_to(&self, url: &str, partial: &Path) -> Result<u64, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(e, url))?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => return Err(FetchError::NotFound(url.to_string())),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(FetchError::PermissionDenied(format!(
                    "{} returned {}",
                    url,
                    response.status()
                )))
            }
            status => {
                return Err(FetchError::TransferFailure(format!(
                    "{} returned {}",
                    url, status
                )))
            }
        }

        self.stream_to_file(response, url, partial).await
    }

    /// Stream response body to file, then flush and sync.
    async fn stream_to_file(&self, response: Response, url: &str, path: &Path) -> Result<u64, FetchError> {
        let mut file = File::create(path)
            .await
            .map_err(|e| FetchError::from_io(e, path))?;

        let mut stream = response.bytes_stream();
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| FetchError::from_reqwest(e, url))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| FetchError::from_io(e, path))?;
            written += chunk.len() as u64;
        }

        file.flush().await.map_err(|e| FetchError::from_io(e, path))?;
        file.sync_all().await.map_err(|e| FetchError::from_io(e, path))?;

        Ok(written)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, key: &RemoteObjectKey, destination: &Path) -> Result<PathBuf, FetchError> {
        let url = self.catalog.url(key);
        prepare_destination(destination).await?;
        let partial = PartialFile::new(destination);

        debug!(url = %url, path = %destination.display(), "Starting download");

        let bytes = self.download_to(&url, partial.path()).await?;
        partial.finish(destination).await?;

        info!(
            url = %url,
            path = %destination.display(),
            bytes = bytes,
            "Download completed"
        );
        Ok(destination.to_path_buf())
    }
}

/// Copies objects out of a local directory laid out like the bucket.
///
/// Useful for offline runs against a pre-populated mirror.
pub struct MirrorFetcher {
    root: PathBuf,
}

impl MirrorFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl Fetcher for MirrorFetcher {
    async fn fetch(&self, key: &RemoteObjectKey, destination: &Path) -> Result<PathBuf, FetchError> {
        let source = self.root.join(key.as_str());
        if !fs::try_exists(&source).await.unwrap_or(false) {
            return Err(FetchError::NotFound(source.display().to_string()));
        }

        prepare_destination(destination).await?;
        let partial = PartialFile::new(destination);

        let bytes = copy_synced(&source, partial.path())
            .await
            .map_err(|e| FetchError::from_io(e, &source))?;
        partial.finish(destination).await?;

        info!(
            source = %source.display(),
            path = %destination.display(),
            bytes = bytes,
            "Copied from mirror"
        );
        Ok(destination.to_path_buf())
    }
}

async fn copy_synced(source: &Path, partial: &Path) -> io::Result<u64> {
    let bytes = fs::copy(source, partial).await?;
    File::open(partial).await?.sync_all().await?;
    Ok(bytes)
}

async fn prepare_destination(destination: &Path) -> Result<(), FetchError> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| FetchError::from_io(e, parent))?;
    }
    Ok(())
}

/// `{destination}.partial`, removed on drop unless moved into place.
/// Also removed when a fetch future is dropped mid-transfer.
struct PartialFile {
    path: PathBuf,
    done: bool,
}

impl PartialFile {
    fn new(destination: &Path) -> Self {
        Self {
            path: partial_path(destination),
            done: false,
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    /// Move the completed file to `destination`.
    async fn finish(mut self, destination: &Path) -> Result<(), FetchError> {
        fs::rename(&self.path, destination)
            .await
            .map_err(|e| FetchError::from_io(e, destination))?;
        self.done = true;
        Ok(())
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if !self.done {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}
