//! Logging configuration using the tracing ecosystem.
//!
//! The crate only emits `tracing` events; hosts decide where they go. Two
//! ready-made subscribers are offered:
//! - [`init`]: daily rotating log file in the user's local data directory
//! - [`init_stderr`]: plain stderr output for command-line hosts
//!
//! Both honour `RUST_LOG` and fall back to `jqlkit=info,warn`.

use std::path::PathBuf;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Default log level if RUST_LOG is not set.
const DEFAULT_LOG_FILTER: &str = "jqlkit=info,warn";

/// Initialize file logging.
///
/// # Log Directory
///
/// - Linux: `~/.local/share/jqlkit/logs/`
/// - macOS: `~/Library/Application Support/jqlkit/logs/`
/// - Windows: `C:\Users\<User>\AppData\Local\jqlkit\logs\`
///
/// Use `RUST_LOG=jqlkit=debug` to see every request and every compiled query.
///
/// # Errors
///
/// Returns an error if the log directory cannot be determined or created,
/// or if a global subscriber is already installed.
pub fn init() -> anyhow::Result<()> {
    let log_dir = get_log_directory()?;
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "jqlkit.log");

    let subscriber = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with(env_filter());

    tracing::subscriber::set_global_default(subscriber)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "jqlkit logging started");
    tracing::debug!(log_dir = %log_dir.display(), "Log directory");

    Ok(())
}

/// Initialize logging to stderr.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_stderr() -> anyhow::Result<()> {
    let subscriber = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(env_filter());

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn get_log_directory() -> anyhow::Result<PathBuf> {
    let base_dir = dirs::data_local_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine local data directory"))?;

    Ok(base_dir.join("jqlkit").join("logs"))
}

/// Get the path where log files are written by [`init`].
pub fn log_directory() -> Option<PathBuf> {
    get_log_directory().ok()
}
