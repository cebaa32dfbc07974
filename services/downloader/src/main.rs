//! GFS extraction run.
//!
//! Reads a JSON run configuration, then fetches, extracts and cleans up
//! every cycle it names.
//!
//! Exit status: 0 when every cycle was processed or skipped cleanly, 1 when
//! any cycle or variable failed, 2 when the configuration is invalid.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use downloader::{
    Fetcher, HttpFetcher, MirrorFetcher, RemoteCatalog, RunConfiguration, RunSummary,
    Runner, RuntimeLogger,
};

#[derive(Parser, Debug)]
#[command(name = "downloader")]
#[command(about = "Fetch GFS GRIB2 files and extract variables to .npy arrays")]
struct Args {
    /// Run configuration file (JSON)
    #[arg(long, env = "GRIB_CONFIG", default_value = "grib.json")]
    config: PathBuf,

    /// Directory for downloaded GRIB2 files and extracted arrays
    #[arg(long, env = "DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Directory for run log files
    #[arg(long, env = "LOG_DIR", default_value = "logs")]
    log_dir: PathBuf,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Copy GRIB2 files from a local mirror of the bucket instead of downloading
    #[arg(long, env = "GFS_MIRROR_DIR")]
    mirror_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let logger = RuntimeLogger::start();

    let config = match RunConfiguration::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            let console = logger.console_subscriber(&args.log_level, std::io::stderr);
            tracing::subscriber::with_default(console, || {
                error!(config = %args.config.display(), error = %e, "Invalid configuration");
            });
            return ExitCode::from(2);
        }
    };

    match run(&args, logger, config).await {
        Ok(summary) if summary.is_clean() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(1),
        Err(e) => {
            let console = logger.console_subscriber(&args.log_level, std::io::stderr);
            tracing::subscriber::with_default(console, || {
                error!(error = %format!("{:#}", e), "Run setup failed");
            });
            ExitCode::from(1)
        }
    }
}

async fn run(args: &Args, logger: RuntimeLogger, config: RunConfiguration) -> Result<RunSummary> {
    let log_path = logger.install(&args.log_level, &args.log_dir, &config.log_file_name())?;

    info!(
        config = %args.config.display(),
        log = %log_path.display(),
        data_dir = %args.data_dir.display(),
        "Starting GFS extraction"
    );

    let fetcher: Arc<dyn Fetcher> = match &args.mirror_dir {
        Some(dir) => {
            info!(mirror = %dir.display(), "Reading GRIB2 files from local mirror");
            Arc::new(MirrorFetcher::new(dir))
        }
        None => Arc::new(HttpFetcher::new(
            RemoteCatalog::new(&config.source),
            config.fetch_timeout,
        )?),
    };

    let runner = Runner::new(config, fetcher, &args.data_dir);
    let summary = runner.run().await;

    info!(
        elapsed_secs = logger.elapsed().as_secs_f64(),
        clean = summary.is_clean(),
        "Finished"
    );
    Ok(summary)
}
