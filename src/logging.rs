//! File logging with `tracing`.
//!
//! The terminal is owned by the dashboard, so nothing is ever written to
//! stdout or stderr. Lines go to a daily rolling file instead.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_FILE_PREFIX: &str = "tickerdash.log";

/// Keeps the background writer alive. Pending lines are flushed on drop.
pub struct LogGuard {
    _file_guard: WorkerGuard,
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence; otherwise the crate logs at `info`, or
/// `debug` when `verbose` is set.
pub fn init_logging(log_dir: Option<PathBuf>, verbose: bool) -> Result<LogGuard> {
    let log_dir = match log_dir {
        Some(dir) => dir,
        None => default_log_dir().context("Could not determine a log directory")?,
    };
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX);
    let (writer, file_guard) = tracing_appender::non_blocking(file_appender);

    let default_level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tickerdash={default_level}")));

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_file(verbose)
        .with_line_number(verbose);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::info!(dir = %log_dir.display(), "logging initialized");
    Ok(LogGuard {
        _file_guard: file_guard,
    })
}

/// `<data_local_dir>/tickerdash/logs`
pub fn default_log_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|p| p.join("tickerdash").join("logs"))
}
