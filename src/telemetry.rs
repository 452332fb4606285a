//! Diagnostics sink setup.
//!
//! Library code only emits `tracing` events; the host installs a subscriber
//! once at startup. Nothing in the calculators depends on one being present.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

pub const DEFAULT_LOG_FILE: &str = "logs/port_analysis.log";

/// Where and how verbosely to log.
#[derive(Debug, Clone)]
pub struct LogSettings {
    pub log_file: PathBuf,
    pub stderr_level: String,
    pub json_level: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            stderr_level: "info".to_string(),
            json_level: "debug".to_string(),
        }
    }
}

impl LogSettings {
    /// Reads `LOG_FILE_PATH`, falling back to the defaults.
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        if let Ok(path) = std::env::var("LOG_FILE_PATH") {
            settings.log_file = PathBuf::from(path);
        }
        settings
    }
}

/// Installs a coloured stderr layer (filter `RUST_LOG`) and a JSON layer
/// written to a daily rolling file (filter `RUST_LOG_JSON`).
///
/// Keep the returned guard alive for as long as logs should be flushed.
pub fn init_tracing(settings: &LogSettings) -> anyhow::Result<WorkerGuard> {
    let log_dir = settings
        .log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("logs"));
    let log_file_name = settings
        .log_file
        .file_name()
        .unwrap_or(OsStr::new("port_analysis.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(
            EnvFilter::from_env("RUST_LOG").add_directive(settings.stderr_level.parse()?),
        );

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(
            EnvFilter::from_env("RUST_LOG_JSON").add_directive(settings.json_level.parse()?),
        );

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .try_init()?;

    Ok(file_guard)
}
