//! Tracing subscriber setup.
//!
//! Console output always goes to stderr. When a log directory is
//! configured, a daily-rolling file is written as well through a
//! non-blocking writer; keep the returned [`WorkerGuard`] alive until exit
//! or buffered lines are lost.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::UtcOffset;
use tracing_subscriber::fmt::time::OffsetTime;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;

pub use tracing_appender::non_blocking::WorkerGuard;

/// File name prefix of the rolling log.
pub const LOG_FILE_PREFIX: &str = "glovis.log";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Failed to create log directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to install tracing subscriber: {0}")]
    Init(String),
}

/// Filter for `level`, overridden by `RUST_LOG` when set.
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Create the log directory if needed.
pub fn prepare_log_directory(dir: &Path) -> Result<(), LoggingError> {
    fs::create_dir_all(dir).map_err(|source| LoggingError::Directory {
        path: dir.to_path_buf(),
        source,
    })
}

fn local_timer() -> OffsetTime<Rfc3339> {
    // Local offset lookup fails once threads are running on some platforms.
    OffsetTime::local_rfc_3339().unwrap_or_else(|_| OffsetTime::new(UtcOffset::UTC, Rfc3339))
}

/// Install the global subscriber.
///
/// Returns the file writer's guard when file logging is enabled.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>, LoggingError> {
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_timer(local_timer())
        .with_target(false);

    let (file, guard) = match &config.directory {
        Some(dir) => {
            prepare_log_directory(dir)?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_timer(local_timer())
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter(&config.level))
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))?;

    tracing::debug!(
        level = %config.level,
        directory = ?config.directory,
        "Logging initialised"
    );
    Ok(guard)
}
