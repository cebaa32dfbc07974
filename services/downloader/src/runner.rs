//! Run orchestration: fetch, decode, extract and clean up one cycle at a time.
//!
//! Cycles run strictly one after another. Within a cycle every variable is
//! extracted on its own blocking worker against the same decoded file, and
//! the GRIB2 file is deleted only after all workers have finished.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use extraction::{
    artifact_file_name, default_variables, ExtractError, VariableExtractor, VariableSpec,
};
use futures::stream::{self, StreamExt};
use gfs_common::ForecastCycle;
use grib2_parser::{DecodedFile, Grib2Opener, GribOpener};
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, error, info};

use crate::catalog::RemoteCatalog;
use crate::config::RunConfiguration;
use crate::download::{FetchError, Fetcher};

/// Lifecycle of one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Pending,
    Fetched,
    Decoded,
    Extracting,
    Done,
    Skipped,
    Failed,
    TimedOut,
}

impl CycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fetched => "fetched",
            Self::Decoded => "decoded",
            Self::Extracting => "extracting",
            Self::Done => "done",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
            Self::TimedOut => "timed_out",
        }
    }
}

/// Deleting a GRIB2 file after extraction failed. Logged, never fatal.
#[derive(Error, Debug)]
#[error("Failed to delete {path}: {source}")]
pub struct CleanupError {
    pub path: String,
    #[source]
    pub source: std::io::Error,
}

/// One variable that could not be extracted.
#[derive(Debug, Clone)]
pub struct VariableFailure {
    pub variable: String,
    pub error: String,
}

/// What happened to one cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle: ForecastCycle,
    pub state: CycleState,
    /// Output files written, in completion order
    pub artifacts: Vec<PathBuf>,
    pub failures: Vec<VariableFailure>,
    /// Variables still being extracted when the extraction deadline passed.
    /// Their workers keep running, so their files may appear after the
    /// report is returned.
    pub unfinished: Vec<String>,
    /// Cycle-level error, for failed and timed out cycles
    pub error: Option<String>,
}

impl CycleReport {
    fn new(cycle: ForecastCycle) -> Self {
        Self {
            cycle,
            state: CycleState::Pending,
            artifacts: Vec::new(),
            failures: Vec::new(),
            unfinished: Vec::new(),
            error: None,
        }
    }

    fn advance(&mut self, state: CycleState) {
        debug!(
            cycle = %self.cycle.label(),
            from = self.state.as_str(),
            to = state.as_str(),
            "Cycle state"
        );
        self.state = state;
    }

    fn fail(mut self, state: CycleState, error: String) -> Self {
        self.advance(state);
        self.error = Some(error);
        self
    }
}

/// Outcome of a whole run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub reports: Vec<CycleReport>,
}

impl RunSummary {
    pub fn count(&self, state: CycleState) -> usize {
        self.reports.iter().filter(|r| r.state == state).count()
    }

    pub fn artifacts(&self) -> impl Iterator<Item = &PathBuf> {
        self.reports.iter().flat_map(|r| r.artifacts.iter())
    }

    pub fn variable_failures(&self) -> usize {
        self.reports.iter().map(|r| r.failures.len()).sum()
    }

    /// No cycle failed or timed out and every variable was written.
    /// Skipped cycles do not count against a run.
    pub fn is_clean(&self) -> bool {
        self.count(CycleState::Failed) == 0
            && self.count(CycleState::TimedOut) == 0
            && self.variable_failures() == 0
    }
}

/// Drives every cycle of a run through fetch, decode, extract and cleanup.
pub struct Runner {
    config: RunConfiguration,
    catalog: RemoteCatalog,
    fetcher: Arc<dyn Fetcher>,
    opener: Arc<dyn GribOpener>,
    extractor: Arc<VariableExtractor>,
    variables: Vec<VariableSpec>,
    data_dir: PathBuf,
}

impl Runner {
    /// Runner over the full variable catalog, decoding with the `grib` crate.
    pub fn new(config: RunConfiguration, fetcher: Arc<dyn Fetcher>, data_dir: impl Into<PathBuf>) -> Self {
        let catalog = RemoteCatalog::new(&config.source);
        Self {
            config,
            catalog,
            fetcher,
            opener: Arc::new(Grib2Opener),
            extractor: Arc::new(VariableExtractor::new()),
            variables: default_variables(),
            data_dir: data_dir.into(),
        }
    }

    pub fn with_opener(mut self, opener: Arc<dyn GribOpener>) -> Self {
        self.opener = opener;
        self
    }

    /// Extract only `variables` instead of the full catalog.
    pub fn with_variables(mut self, variables: Vec<VariableSpec>) -> Self {
        self.variables = variables;
        self
    }

    /// Directory holding the scratch GRIB2 file and outputs for `cycle`.
    pub fn cycle_dir(&self, cycle: &ForecastCycle) -> PathBuf {
        self.data_dir.join(cycle.date_token())
    }

    /// Process every cycle of the configuration in order.
    pub async fn run(&self) -> RunSummary {
        let cycles = self.config.cycles();
        info!(
            cycles = cycles.len(),
            variables = self.variables.len(),
            start = %self.config.start_date,
            end = %self.config.end_date,
            resolution = %self.config.resolution,
            "Starting run"
        );

        let mut summary = RunSummary::default();
        for cycle in cycles {
            let report = self.run_cycle(cycle).await;
            summary.reports.push(report);
        }

        info!(
            done = summary.count(CycleState::Done),
            skipped = summary.count(CycleState::Skipped),
            failed = summary.count(CycleState::Failed),
            timed_out = summary.count(CycleState::TimedOut),
            artifacts = summary.artifacts().count(),
            variable_failures = summary.variable_failures(),
            "Run complete"
        );
        summary
    }

    /// Process one cycle. Errors end the cycle, never the run.
    pub async fn run_cycle(&self, cycle: ForecastCycle) -> CycleReport {
        let mut report = CycleReport::new(cycle);
        let label = cycle.label();

        let key = self.catalog.resolve(&cycle);
        let destination = self.cycle_dir(&cycle).join(RemoteCatalog::file_name(&cycle));

        info!(cycle = %label, key = %key, "Fetching");
        let grib_path = match timeout(self.config.fetch_timeout, self.fetcher.fetch(&key, &destination)).await {
            Err(_) => {
                error!(
                    cycle = %label,
                    key = %key,
                    timeout_secs = self.config.fetch_timeout.as_secs(),
                    "Fetch deadline exceeded"
                );
                return report.fail(CycleState::TimedOut, "fetch deadline exceeded".to_string());
            }
            Ok(Err(FetchError::NotFound(what))) => {
                info!(cycle = %label, key = %key, "File not available, skipping");
                return report.fail(CycleState::Skipped, format!("not found: {}", what));
            }
            Ok(Err(e @ FetchError::Timeout(_))) => {
                error!(cycle = %label, key = %key, error = %e, "Fetch timed out");
                return report.fail(CycleState::TimedOut, e.to_string());
            }
            Ok(Err(e)) => {
                error!(cycle = %label, key = %key, error = %e, "Fetch failed");
                return report.fail(CycleState::Failed, e.to_string());
            }
            Ok(Ok(path)) => path,
        };
        report.advance(CycleState::Fetched);

        let file = match self.open(&grib_path).await {
            Ok(file) => file,
            Err(e) => {
                error!(
                    cycle = %label,
                    path = %grib_path.display(),
                    error = %e,
                    "Failed to open GRIB2 file"
                );
                return report.fail(CycleState::Failed, e);
            }
        };
        report.advance(CycleState::Decoded);

        report.advance(CycleState::Extracting);
        let mut results = Vec::with_capacity(self.variables.len());
        let barrier = timeout(
            self.config.extract_deadline,
            self.extract_all(&cycle, file, &mut results),
        )
        .await;

        let finished: Vec<&'static str> = results.iter().map(|(variable, _)| *variable).collect();
        for (variable, result) in results {
            match result {
                Ok(path) => report.artifacts.push(path),
                Err(e) => {
                    error!(cycle = %label, variable = variable, error = %e, "Extraction failed");
                    report.failures.push(VariableFailure {
                        variable: variable.to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        if barrier.is_err() {
            report.unfinished = self
                .variables
                .iter()
                .map(|spec| spec.canonical_name)
                .filter(|name| !finished.contains(name))
                .map(str::to_string)
                .collect();
            // Workers may still be reading the file, so it stays on disk.
            error!(
                cycle = %label,
                path = %grib_path.display(),
                timeout_secs = self.config.extract_deadline.as_secs(),
                unfinished = ?report.unfinished,
                "Extraction deadline exceeded"
            );
            return report.fail(CycleState::TimedOut, "extraction deadline exceeded".to_string());
        }

        if self.config.cleanup_after_extract {
            match remove_grib(&grib_path).await {
                Ok(()) => debug!(cycle = %label, path = %grib_path.display(), "Deleted GRIB2 file"),
                Err(e) => error!(cycle = %label, error = %e, "Cleanup failed"),
            }
        }

        report.advance(CycleState::Done);
        info!(
            cycle = %label,
            written = report.artifacts.len(),
            failed = report.failures.len(),
            "Cycle complete"
        );
        report
    }

    async fn open(&self, path: &Path) -> Result<Arc<dyn DecodedFile>, String> {
        let opener = Arc::clone(&self.opener);
        let path = path.to_path_buf();
        match tokio::task::spawn_blocking(move || opener.open(&path)).await {
            Ok(Ok(file)) => Ok(file),
            Ok(Err(e)) => Err(e.to_string()),
            Err(e) => Err(format!("decode worker failed: {}", e)),
        }
    }

    /// Extract every variable concurrently, pushing each outcome into
    /// `results` as it completes.
    async fn extract_all(
        &self,
        cycle: &ForecastCycle,
        file: Arc<dyn DecodedFile>,
        results: &mut Vec<(&'static str, Result<PathBuf, ExtractError>)>,
    ) {
        let bounds = self.config.region();
        let cycle_dir = self.cycle_dir(cycle);
        let width = self.variables.len().max(1);

        let mut outcomes = stream::iter(self.variables.iter().cloned())
            .map(|spec| {
                let file = Arc::clone(&file);
                let extractor = Arc::clone(&self.extractor);
                let output = cycle_dir.join(artifact_file_name(cycle, spec.canonical_name));
                async move {
                    let variable = spec.canonical_name;
                    let result = tokio::task::spawn_blocking(move || {
                        extractor
                            .extract(file.as_ref(), &spec, bounds.as_ref(), &output)
                            .map(|artifact| artifact.path)
                    })
                    .await
                    .unwrap_or_else(|e| Err(ExtractError::Worker(e.to_string())));
                    (variable, result)
                }
            })
            .buffer_unordered(width);

        while let Some(outcome) = outcomes.next().await {
            results.push(outcome);
        }
    }
}

async fn remove_grib(path: &Path) -> Result<(), CleanupError> {
    tokio::fs::remove_file(path)
        .await
        .map_err(|source| CleanupError {
            path: path.display().to_string(),
            source,
        })
}
