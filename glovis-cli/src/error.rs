//! CLI error type.

use std::fmt;

use glovis::config::ConfigError;
use glovis::logging::LoggingError;
use glovis::scene_list::SceneListError;

/// Errors surfaced to the user. Every variant exits with status 1.
#[derive(Debug)]
pub enum CliError {
    /// Configuration could not be read, written or changed.
    Config(String),
    /// A scene-list file is unreadable or malformed.
    SceneList(String),
    /// Logging could not be set up.
    Logging(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::SceneList(msg) => write!(f, "Scene list error: {}", msg),
            CliError::Logging(msg) => write!(f, "Logging error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<SceneListError> for CliError {
    fn from(e: SceneListError) -> Self {
        CliError::SceneList(e.to_string())
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e.to_string())
    }
}

impl CliError {
    /// Print the error and exit.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);
        std::process::exit(1);
    }
}
