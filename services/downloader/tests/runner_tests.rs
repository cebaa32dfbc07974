//! Runner behaviour against a local mirror, synthetic GRIB2 files and fake
//! decoders.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use downloader::{
    CycleState, FetchError, Fetcher, HttpFetcher, MirrorFetcher, RemoteCatalog, RemoteObjectKey,
    RunConfiguration, Runner,
};
use extraction::{default_variables, find_variable, read_npy};
use gfs_common::ForecastCycle;
use grib2_parser::{
    level_types, DecodedField, DecodedFile, FieldSelector, Grib2Error, Grib2Result, GribOpener,
};
use ndarray::Array2;
use test_utils::fixtures::grid;
use test_utils::grib2::write_grib2_file;
use test_utils::{create_temperature_grid, Grib2Builder};

fn config(json: &str) -> RunConfiguration {
    RunConfiguration::from_json(json).unwrap()
}

/// Place a synthetic file holding 2 m temperature and surface pressure in
/// the mirror at the key for `cycle`.
fn publish_grib(mirror: &Path, cycle: &ForecastCycle, config: &RunConfiguration) {
    let key = RemoteCatalog::new(&config.source).resolve(cycle);
    let path = mirror.join(key.as_str());
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();

    let spec = grid::NA_HALF_DEGREE;
    let base = Grib2Builder::new_gfs()
        .with_grid_spec(&spec)
        .with_forecast_hour(cycle.forecast_hour);
    write_grib2_file(
        &path,
        &[
            base.clone()
                .with_data(create_temperature_grid(spec.ni, spec.nj)),
            base.with_parameter(3, 0)
                .with_level(level_types::SURFACE, 0)
                .with_gradient(95000.0, 103000.0),
        ],
    )
    .unwrap();
}

/// Place an arbitrary placeholder at the key for `cycle`, for fake openers.
fn publish_placeholder(mirror: &Path, cycle: &ForecastCycle, config: &RunConfiguration) {
    let key = RemoteCatalog::new(&config.source).resolve(cycle);
    let path = mirror.join(key.as_str());
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, b"placeholder").unwrap();
}

fn files_in(dir: &Path) -> BTreeSet<String> {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default()
}

/// Serves a small North American field for every selector. Reading the
/// selector in `slow` takes `delay` and records whether `watched` still
/// exists afterwards. With `remove_watched`, every read deletes `watched`.
struct FakeFile {
    slow: Option<FieldSelector>,
    delay: Duration,
    remove_watched: bool,
    watched: PathBuf,
    existed_after_delay: Arc<AtomicBool>,
}

impl DecodedFile for FakeFile {
    fn read_field(&self, selector: &FieldSelector) -> Grib2Result<Option<DecodedField>> {
        if self.remove_watched {
            let _ = std::fs::remove_file(&self.watched);
        }
        if self.slow == Some(*selector) {
            std::thread::sleep(self.delay);
            self.existed_after_delay
                .store(self.watched.exists(), Ordering::SeqCst);
        }

        let values = Array2::from_shape_fn((3, 3), |(r, c)| (r * 3 + c) as f32);
        DecodedField::new(values, vec![50.0, 40.0, 30.0], vec![250.0, 260.0, 270.0]).map(Some)
    }
}

struct FakeOpener {
    slow: Option<FieldSelector>,
    delay: Duration,
    remove_watched: bool,
    existed_after_delay: Arc<AtomicBool>,
    opened: Mutex<Vec<PathBuf>>,
}

impl FakeOpener {
    fn new() -> Self {
        Self {
            slow: None,
            delay: Duration::ZERO,
            remove_watched: false,
            existed_after_delay: Arc::new(AtomicBool::new(false)),
            opened: Mutex::new(Vec::new()),
        }
    }

    fn slow(selector: FieldSelector, delay: Duration) -> Self {
        Self {
            slow: Some(selector),
            delay,
            ..Self::new()
        }
    }

    /// Deletes the opened file while its variables are being read.
    fn removing() -> Self {
        Self {
            remove_watched: true,
            ..Self::new()
        }
    }
}

impl GribOpener for FakeOpener {
    fn open(&self, path: &Path) -> Grib2Result<Arc<dyn DecodedFile>> {
        self.opened.lock().unwrap().push(path.to_path_buf());
        Ok(Arc::new(FakeFile {
            slow: self.slow,
            delay: self.delay,
            remove_watched: self.remove_watched,
            watched: path.to_path_buf(),
            existed_after_delay: Arc::clone(&self.existed_after_delay),
        }))
    }
}

struct BrokenOpener;

impl GribOpener for BrokenOpener {
    fn open(&self, path: &Path) -> Grib2Result<Arc<dyn DecodedFile>> {
        Err(Grib2Error::Open {
            path: path.display().to_string(),
            message: "not a GRIB2 file".to_string(),
        })
    }
}

/// Answer one request with a 200 that announces a large body, send a few
/// bytes of it and then hang.
async fn serve_stalled_download() -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 4096];
        let _ = socket.read(&mut request).await.unwrap();
        socket
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 1000000\r\n\r\nGRIB")
            .await
            .unwrap();
        socket.flush().await.unwrap();
        tokio::time::sleep(Duration::from_secs(60)).await;
    });
    format!("http://{}", addr)
}

struct StalledFetcher;

#[async_trait]
impl Fetcher for StalledFetcher {
    async fn fetch(&self, _key: &RemoteObjectKey, _destination: &Path) -> Result<PathBuf, FetchError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Err(FetchError::TransferFailure("unreachable".to_string()))
    }
}

#[tokio::test]
async fn test_single_cycle_scenario() {
    let mirror = tempfile::tempdir().unwrap();
    let data = tempfile::tempdir().unwrap();
    let config = config(
        r#"{
            "start_date": "20240301",
            "end_date": "20240301",
            "zulus": "00",
            "resolution": "1p00",
            "na_bounds": true,
            "cleanup": true,
            "forecast_hours": {"start": 0, "end": 0, "step": 3}
        }"#,
    );
    let cycle = config.cycles()[0];
    publish_grib(mirror.path(), &cycle, &config);

    let variables = vec![find_variable("2t").unwrap(), find_variable("sp").unwrap()];
    let runner = Runner::new(config, Arc::new(MirrorFetcher::new(mirror.path())), data.path())
        .with_variables(variables);

    let summary = runner.run().await;

    assert!(summary.is_clean());
    assert_eq!(summary.count(CycleState::Done), 1);

    let day_dir = data.path().join("20240301");
    let expected: BTreeSet<String> = [
        "gfs_20240301_t00z_1p00_f000_2t.npy",
        "gfs_20240301_t00z_1p00_f000_sp.npy",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    assert_eq!(files_in(&day_dir), expected);

    for name in &expected {
        let grid = read_npy(&day_dir.join(name)).unwrap();
        assert_eq!(grid.dim(), (45, 85), "{} not cropped to North America", name);
    }
}

#[tokio::test]
async fn test_missing_file_is_skipped_and_run_continues() {
    let mirror = tempfile::tempdir().unwrap();
    let data = tempfile::tempdir().unwrap();
    let config = config(
        r#"{
            "start_date": "20240301",
            "end_date": "20240301",
            "zulus": "00",
            "forecast_hours": {"start": 0, "end": 3, "step": 3}
        }"#,
    );
    // Only f003 is published
    let cycles = config.cycles();
    publish_placeholder(mirror.path(), &cycles[1], &config);

    let runner = Runner::new(config, Arc::new(MirrorFetcher::new(mirror.path())), data.path())
        .with_opener(Arc::new(FakeOpener::new()))
        .with_variables(vec![find_variable("2t").unwrap()]);

    let summary = runner.run().await;

    assert_eq!(summary.reports[0].state, CycleState::Skipped);
    assert!(summary.reports[0].artifacts.is_empty());
    assert_eq!(summary.reports[1].state, CycleState::Done);
    assert!(summary.is_clean());
    assert_eq!(
        files_in(&data.path().join("20240301")),
        BTreeSet::from(["gfs_20240301_t00z_1p00_f003_2t.npy".to_string()])
    );
}

#[tokio::test]
async fn test_grib_deleted_only_after_slowest_worker() {
    let mirror = tempfile::tempdir().unwrap();
    let data = tempfile::tempdir().unwrap();
    let config = config(
        r#"{
            "start_date": "20240301",
            "end_date": "20240301",
            "zulus": "06",
            "forecast_hours": {"start": 0, "end": 0, "step": 3}
        }"#,
    );
    let cycle = config.cycles()[0];
    publish_placeholder(mirror.path(), &cycle, &config);

    let gh700 = find_variable("gh700").unwrap();
    let opener = Arc::new(FakeOpener::slow(gh700.selector, Duration::from_millis(500)));
    let existed = Arc::clone(&opener.existed_after_delay);

    let runner = Runner::new(config, Arc::new(MirrorFetcher::new(mirror.path())), data.path())
        .with_opener(opener.clone());
    let grib_path = runner
        .cycle_dir(&cycle)
        .join(RemoteCatalog::file_name(&cycle));

    let summary = runner.run().await;

    assert_eq!(summary.reports[0].state, CycleState::Done);
    assert_eq!(summary.reports[0].artifacts.len(), 5);
    assert!(
        existed.load(Ordering::SeqCst),
        "GRIB2 file was deleted while a worker was still reading it"
    );
    assert!(!grib_path.exists());
    assert_eq!(opener.opened.lock().unwrap().as_slice(), &[grib_path]);
}

#[tokio::test]
async fn test_output_set_matches_completed_cycles() {
    let mirror = tempfile::tempdir().unwrap();
    let data = tempfile::tempdir().unwrap();
    let config = config(
        r#"{
            "start_date": "20240301",
            "end_date": "20240302",
            "zulus": "00,12",
            "forecast_hours": {"start": 0, "end": 0, "step": 3}
        }"#,
    );
    let cycles = config.cycles();
    // 20240302 12z is never published
    for cycle in &cycles[..3] {
        publish_placeholder(mirror.path(), cycle, &config);
    }

    let runner = Runner::new(config, Arc::new(MirrorFetcher::new(mirror.path())), data.path())
        .with_opener(Arc::new(FakeOpener::new()));

    let summary = runner.run().await;

    let mut expected = BTreeSet::new();
    for cycle in &cycles[..3] {
        for spec in default_variables() {
            expected.insert(
                data.path()
                    .join(cycle.date_token())
                    .join(extraction::artifact_file_name(cycle, spec.canonical_name)),
            );
        }
    }

    let produced: Vec<PathBuf> = summary.artifacts().cloned().collect();
    let unique: BTreeSet<PathBuf> = produced.iter().cloned().collect();
    assert_eq!(produced.len(), unique.len(), "duplicate artifacts");
    assert_eq!(unique, expected);

    assert_eq!(summary.count(CycleState::Done), 3);
    assert_eq!(summary.count(CycleState::Skipped), 1);
    for path in &unique {
        assert!(path.exists(), "{} missing", path.display());
    }
}

#[tokio::test]
async fn test_variable_failure_does_not_affect_siblings() {
    let mirror = tempfile::tempdir().unwrap();
    let data = tempfile::tempdir().unwrap();
    let config = config(
        r#"{
            "start_date": "20240301",
            "end_date": "20240301",
            "zulus": "00",
            "forecast_hours": {"start": 0, "end": 0, "step": 3}
        }"#,
    );
    let cycle = config.cycles()[0];
    // The synthetic file has no geopotential height records
    publish_grib(mirror.path(), &cycle, &config);

    let runner = Runner::new(config, Arc::new(MirrorFetcher::new(mirror.path())), data.path());
    let summary = runner.run().await;
    let report = &summary.reports[0];

    assert_eq!(report.state, CycleState::Done);
    assert_eq!(report.artifacts.len(), 2);
    let failed: BTreeSet<&str> = report.failures.iter().map(|f| f.variable.as_str()).collect();
    assert_eq!(failed, BTreeSet::from(["gh200", "gh500", "gh700"]));
    assert!(!summary.is_clean());
}

#[tokio::test]
async fn test_extraction_deadline_keeps_grib_file() {
    let mirror = tempfile::tempdir().unwrap();
    let data = tempfile::tempdir().unwrap();
    let mut config = config(
        r#"{
            "start_date": "20240301",
            "end_date": "20240301",
            "zulus": "18",
            "forecast_hours": {"start": 0, "end": 0, "step": 3}
        }"#,
    );
    config.extract_deadline = Duration::from_millis(400);
    let cycle = config.cycles()[0];
    publish_placeholder(mirror.path(), &cycle, &config);

    let sp = find_variable("sp").unwrap();
    let opener = Arc::new(FakeOpener::slow(sp.selector, Duration::from_millis(2000)));
    let runner = Runner::new(config, Arc::new(MirrorFetcher::new(mirror.path())), data.path())
        .with_opener(opener);
    let grib_path = runner
        .cycle_dir(&cycle)
        .join(RemoteCatalog::file_name(&cycle));

    let summary = runner.run().await;

    let report = &summary.reports[0];
    assert_eq!(report.state, CycleState::TimedOut);
    assert!(grib_path.exists());
    assert!(!summary.is_clean());

    // Variables that beat the deadline are reported, the straggler is not
    assert_eq!(report.artifacts.len(), 4);
    assert!(report.artifacts.iter().all(|path| path.exists()));
    assert_eq!(report.unfinished, vec!["sp".to_string()]);
}

#[tokio::test]
async fn test_fetch_deadline() {
    let data = tempfile::tempdir().unwrap();
    let mut config = config(
        r#"{
            "start_date": "20240301",
            "end_date": "20240301",
            "zulus": "00",
            "forecast_hours": {"start": 0, "end": 0, "step": 3}
        }"#,
    );
    config.fetch_timeout = Duration::from_millis(50);

    let runner = Runner::new(config, Arc::new(StalledFetcher), data.path());
    let summary = runner.run().await;

    assert_eq!(summary.reports[0].state, CycleState::TimedOut);
    assert!(summary.artifacts().next().is_none());
}

#[tokio::test]
async fn test_unreadable_grib_fails_cycle_and_keeps_file() {
    let mirror = tempfile::tempdir().unwrap();
    let data = tempfile::tempdir().unwrap();
    let config = config(
        r#"{
            "start_date": "20240301",
            "end_date": "20240301",
            "zulus": "00",
            "forecast_hours": {"start": 0, "end": 0, "step": 3}
        }"#,
    );
    let cycle = config.cycles()[0];
    publish_placeholder(mirror.path(), &cycle, &config);

    let runner = Runner::new(config, Arc::new(MirrorFetcher::new(mirror.path())), data.path())
        .with_opener(Arc::new(BrokenOpener));
    let grib_path = runner
        .cycle_dir(&cycle)
        .join(RemoteCatalog::file_name(&cycle));

    let summary = runner.run().await;

    assert_eq!(summary.reports[0].state, CycleState::Failed);
    assert!(summary.reports[0].error.is_some());
    assert!(grib_path.exists());
    assert_eq!(
        files_in(&data.path().join("20240301")),
        BTreeSet::from(["gfs.t00z.pgrb2.1p00.f000".to_string()])
    );
}

#[tokio::test]
async fn test_cleanup_disabled_keeps_grib_file() {
    let mirror = tempfile::tempdir().unwrap();
    let data = tempfile::tempdir().unwrap();
    let config = config(
        r#"{
            "start_date": "20240301",
            "end_date": "20240301",
            "zulus": "00",
            "cleanup": false,
            "na_bounds": false,
            "forecast_hours": {"start": 0, "end": 0, "step": 3}
        }"#,
    );
    let cycle = config.cycles()[0];
    publish_grib(mirror.path(), &cycle, &config);

    let runner = Runner::new(config, Arc::new(MirrorFetcher::new(mirror.path())), data.path())
        .with_variables(vec![find_variable("2t").unwrap()]);
    let grib_path = runner
        .cycle_dir(&cycle)
        .join(RemoteCatalog::file_name(&cycle));

    let summary = runner.run().await;

    assert!(summary.is_clean());
    assert!(grib_path.exists());
    let grid = read_npy(&summary.reports[0].artifacts[0]).unwrap();
    assert_eq!(grid.dim(), (66, 121));
}

#[tokio::test]
async fn test_fetch_deadline_mid_download_leaves_no_partial_file() {
    let data = tempfile::tempdir().unwrap();
    let endpoint = serve_stalled_download().await;
    let mut config = config(&format!(
        r#"{{
            "start_date": "20240301",
            "end_date": "20240301",
            "zulus": "00",
            "forecast_hours": {{"start": 0, "end": 0, "step": 3}},
            "source": {{"endpoint": "{}"}}
        }}"#,
        endpoint
    ));
    config.fetch_timeout = Duration::from_millis(500);

    // Client timeout well past the run deadline, so the run deadline fires first
    let fetcher = HttpFetcher::new(RemoteCatalog::new(&config.source), Duration::from_secs(30)).unwrap();
    let runner = Runner::new(config, Arc::new(fetcher), data.path());

    let summary = runner.run().await;

    assert_eq!(summary.reports[0].state, CycleState::TimedOut);
    assert!(files_in(&data.path().join("20240301")).is_empty());
}

#[tokio::test]
async fn test_failed_cleanup_is_not_fatal() {
    let mirror = tempfile::tempdir().unwrap();
    let data = tempfile::tempdir().unwrap();
    let config = config(
        r#"{
            "start_date": "20240301",
            "end_date": "20240301",
            "zulus": "00",
            "forecast_hours": {"start": 0, "end": 3, "step": 3}
        }"#,
    );
    let cycles = config.cycles();
    for cycle in &cycles {
        publish_placeholder(mirror.path(), cycle, &config);
    }

    // The GRIB2 file is gone by the time cleanup tries to delete it
    let runner = Runner::new(config, Arc::new(MirrorFetcher::new(mirror.path())), data.path())
        .with_opener(Arc::new(FakeOpener::removing()));
    let grib_paths: Vec<PathBuf> = cycles
        .iter()
        .map(|cycle| runner.cycle_dir(cycle).join(RemoteCatalog::file_name(cycle)))
        .collect();

    let summary = runner.run().await;

    assert_eq!(summary.reports.len(), 2);
    for report in &summary.reports {
        assert_eq!(report.state, CycleState::Done);
        assert_eq!(report.artifacts.len(), 5);
        assert!(report.error.is_none());
        assert!(report.artifacts.iter().all(|path| path.exists()));
    }
    assert!(summary.is_clean());
    assert!(grib_paths.iter().all(|path| !path.exists()));
}
