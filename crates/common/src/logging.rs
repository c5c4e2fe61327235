//! Per-run logging: one timestamped log file plus mirrored console output.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Timestamp format shared by log file names and output directories
pub const RUN_STAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

pub fn run_stamp(at: DateTime<Local>) -> String {
    at.format(RUN_STAMP_FORMAT).to_string()
}

/// Keeps the background log writer alive; drop it last so buffered lines reach the file.
pub struct LogGuard {
    pub log_file: PathBuf,
    _guard: WorkerGuard,
}

/// Install the global subscriber writing to `{log_dir}/{prefix}_{stamp}.log` and stdout.
///
/// `RUST_LOG` overrides the default `info` level for both outputs.
pub fn init_logging(log_dir: &Path, prefix: &str, stamp: &str) -> Result<LogGuard> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let file_name = format!("{}_{}.log", prefix, stamp);
    let log_file = log_dir.join(&file_name);
    let appender = tracing_appender::rolling::never(log_dir, &file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);

    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    let console_layer = fmt::layer().with_target(false);
    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_filter(LevelFilter::DEBUG);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::info!("Logging to {}", log_file.display());

    Ok(LogGuard {
        log_file,
        _guard: guard,
    })
}
