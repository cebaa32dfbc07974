//! Run logging: one line format shared by the console and a per-run file.
//!
//! Every line reads
//! `INFO, timestamp: 2024-03-01 06:00:00, runtime: 12.34s, message: ...`
//! where runtime is measured from the moment the logger was started.

use std::fmt;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Local;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Logging context for one run. Holds the origin that runtimes are measured from.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeLogger {
    origin: Instant,
}

impl RuntimeLogger {
    /// Capture the run origin. Call once at startup.
    pub fn start() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }

    pub fn format(&self) -> RuntimeFormat {
        RuntimeFormat {
            origin: self.origin,
        }
    }

    /// Install the global subscriber: console plus an append-only file at
    /// `{log_dir}/{file_name}`. Returns the log file path.
    ///
    /// `RUST_LOG` takes precedence over `level` when set.
    pub fn install(&self, level: &str, log_dir: &Path, file_name: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(log_dir)
            .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

        let path = log_dir.join(file_name);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;

        tracing_subscriber::registry()
            .with(level_filter(level))
            .with(
                tracing_subscriber::fmt::layer()
                    .event_format(self.format())
                    .with_writer(std::io::stdout),
            )
            .with(
                tracing_subscriber::fmt::layer()
                    .event_format(self.format())
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .try_init()
            .context("Failed to install tracing subscriber")?;

        Ok(path)
    }

    /// Subscriber writing the run line format to `writer` only, for errors
    /// raised before the run log exists.
    pub fn console_subscriber<W>(&self, level: &str, writer: W) -> impl Subscriber + Send + Sync + 'static
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        tracing_subscriber::registry().with(level_filter(level)).with(
            tracing_subscriber::fmt::layer()
                .event_format(self.format())
                .with_ansi(false)
                .with_writer(writer),
        )
    }
}

/// `RUST_LOG` when set, otherwise `level`.
fn level_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(parse_level(level).as_str()))
}

/// Parse a log level name, falling back to INFO.
pub fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Event formatter writing the run log line format.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeFormat {
    origin: Instant,
}

impl RuntimeFormat {
    fn write_prefix(&self, writer: &mut impl fmt::Write, level: &Level) -> fmt::Result {
        write!(
            writer,
            "{}, timestamp: {}, runtime: {:.2}s, message: ",
            level,
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            self.origin.elapsed().as_secs_f64()
        )
    }
}

impl<S, N> FormatEvent<S, N> for RuntimeFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        self.write_prefix(&mut writer, event.metadata().level())?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
