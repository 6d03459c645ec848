//! Logging initialization: console stream mirrored into an append-mode file.
//!
//! Every run logs to stdout and to the operator-chosen logfile. The file
//! sink appends across runs, carries no ANSI escapes, and records at `debug`
//! regardless of the console verbosity, so post-hoc review of `download.log`
//! sees every per-record entry. `RUST_LOG` overrides both sinks.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Default level for the file sink, independent of console verbosity.
const FILE_DEFAULT_LEVEL: &str = "debug";

/// Initializes the global subscriber with a console layer and an append-mode
/// file layer at `logfile`.
///
/// The returned guard must be held for the program's lifetime so buffered
/// log lines are flushed on shutdown.
///
/// # Errors
///
/// Fails when the logfile path has no file name, its parent directory cannot
/// be created, or a global subscriber is already installed.
pub fn init_logging(logfile: &Path, default_level: &str) -> Result<WorkerGuard> {
    let file_name = logfile
        .file_name()
        .with_context(|| format!("logfile path '{}' has no file name", logfile.display()))?;
    let log_dir = match logfile.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory '{}'", log_dir.display()))?;

    // `never` rotation = one stable file, opened in append mode.
    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    // Each sink gets its own filter: the console follows the verbosity
    // flags, the file always captures per-record debug entries.
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let file_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(FILE_DEFAULT_LEVEL));

    let console_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_filter(console_filter);
    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_filter(file_filter);

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(guard)
}
