//! Configuration file handling.
//!
//! Settings live in an INI file at `~/.config/glovis/config.ini` (or the
//! platform equivalent). A missing file yields the defaults; a missing key
//! keeps its default.
//!
//! ```ini
//! [browser]
//! sensor = Landsat 7 ETM+
//! grid_size = 3
//! base_url = https://glovis.usgs.gov/ImgViewer
//!
//! [filter]
//! max_cloud_cover = 30
//! min_quality = 0
//! data_version = All
//! start_year = 2000
//! end_year = 2010
//! ; zero-based months, 10 = November
//! start_month = 10
//! end_month = 1
//! downloadable_only = false
//!
//! [logging]
//! level = info
//! directory = /var/log/glovis
//! ```
//!
//! Every setting is addressable as `section.key` through [`ConfigKey`].

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ini::Ini;
use thiserror::Error;
use tracing::debug;

use crate::grid::DEFAULT_GRID_SIZE;
use crate::scene::{DateRange, ALL_DATA_VERSIONS};
use crate::sensor::SensorKind;

/// Default image server root.
pub const DEFAULT_BASE_URL: &str = "https://glovis.usgs.gov/ImgViewer";

/// Largest supported tile grid.
pub const MAX_GRID_SIZE: usize = 9;

/// Levels accepted by `logging.level`.
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Errors from loading, saving or editing the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// `[browser]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct BrowserConfig {
    pub sensor: SensorKind,
    /// Tiles per side; odd so the selected cell is centred.
    pub grid_size: usize,
    pub base_url: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            sensor: SensorKind::LandsatEtm,
            grid_size: DEFAULT_GRID_SIZE,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// `[filter]` section: the persisted search limits.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterConfig {
    pub max_cloud_cover: u8,
    pub min_quality: u8,
    pub data_version: String,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    /// Zero-based, 0 = January.
    pub start_month: u32,
    /// Zero-based, 11 = December.
    pub end_month: u32,
    pub downloadable_only: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            max_cloud_cover: 100,
            min_quality: 0,
            data_version: ALL_DATA_VERSIONS.to_string(),
            start_year: None,
            end_year: None,
            start_month: 0,
            end_month: 11,
            downloadable_only: false,
        }
    }
}

impl FilterConfig {
    /// Date window with open year bounds filled in.
    pub fn date_range(&self) -> DateRange {
        DateRange::new(
            self.start_year.unwrap_or(i32::MIN),
            self.end_year.unwrap_or(i32::MAX),
            self.start_month,
            self.end_month,
        )
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    pub level: String,
    /// Directory for daily log files; console only when unset.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}

/// The whole configuration file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub browser: BrowserConfig,
    pub filter: FilterConfig,
    pub logging: LoggingConfig,
}

impl ConfigFile {
    /// Load from the default location.
    pub fn load() -> ConfigResult<Self> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`, falling back to defaults if it does not exist.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let ini = Ini::load_from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    /// Build from parsed INI data. Unknown sections and keys are ignored.
    pub fn from_ini(ini: &Ini) -> ConfigResult<Self> {
        let mut config = Self::default();
        for key in ConfigKey::all() {
            let value = ini
                .section(Some(key.section()))
                .and_then(|s| s.get(key.key_name()));
            if let Some(value) = value {
                key.set(&mut config, value)?;
            }
        }
        Ok(config)
    }

    /// INI representation. Unset optional values are omitted.
    pub fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        for key in ConfigKey::all() {
            let value = key.get(self);
            if !value.is_empty() {
                ini.with_section(Some(key.section()))
                    .set(key.key_name(), value);
            }
        }
        ini
    }

    /// Save to the default location.
    pub fn save(&self) -> ConfigResult<()> {
        self.save_to(&config_file_path())
    }

    /// Save to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        self.to_ini().write_to_file(path).map_err(write_err)?;
        debug!(path = %path.display(), "Config saved");
        Ok(())
    }
}

/// Path of the configuration file.
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

/// Directory holding the configuration file.
pub fn config_directory() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("glovis")
}

/// A `section.key` setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    BrowserSensor,
    BrowserGridSize,
    BrowserBaseUrl,
    FilterMaxCloudCover,
    FilterMinQuality,
    FilterDataVersion,
    FilterStartYear,
    FilterEndYear,
    FilterStartMonth,
    FilterEndMonth,
    FilterDownloadableOnly,
    LoggingLevel,
    LoggingDirectory,
}

impl ConfigKey {
    /// Section names in file order.
    pub const SECTIONS: [&'static str; 3] = ["browser", "filter", "logging"];

    /// Every key in file order.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::BrowserSensor,
            ConfigKey::BrowserGridSize,
            ConfigKey::BrowserBaseUrl,
            ConfigKey::FilterMaxCloudCover,
            ConfigKey::FilterMinQuality,
            ConfigKey::FilterDataVersion,
            ConfigKey::FilterStartYear,
            ConfigKey::FilterEndYear,
            ConfigKey::FilterStartMonth,
            ConfigKey::FilterEndMonth,
            ConfigKey::FilterDownloadableOnly,
            ConfigKey::LoggingLevel,
            ConfigKey::LoggingDirectory,
        ]
    }

    /// Full `section.key` name.
    pub fn name(&self) -> &'static str {
        match self {
            ConfigKey::BrowserSensor => "browser.sensor",
            ConfigKey::BrowserGridSize => "browser.grid_size",
            ConfigKey::BrowserBaseUrl => "browser.base_url",
            ConfigKey::FilterMaxCloudCover => "filter.max_cloud_cover",
            ConfigKey::FilterMinQuality => "filter.min_quality",
            ConfigKey::FilterDataVersion => "filter.data_version",
            ConfigKey::FilterStartYear => "filter.start_year",
            ConfigKey::FilterEndYear => "filter.end_year",
            ConfigKey::FilterStartMonth => "filter.start_month",
            ConfigKey::FilterEndMonth => "filter.end_month",
            ConfigKey::FilterDownloadableOnly => "filter.downloadable_only",
            ConfigKey::LoggingLevel => "logging.level",
            ConfigKey::LoggingDirectory => "logging.directory",
        }
    }

    pub fn section(&self) -> &'static str {
        self.split().0
    }

    pub fn key_name(&self) -> &'static str {
        self.split().1
    }

    fn split(&self) -> (&'static str, &'static str) {
        let name = self.name();
        name.split_once('.').unwrap_or(("", name))
    }

    /// Keys of one section, in file order.
    pub fn in_section(section: &str) -> impl Iterator<Item = ConfigKey> + '_ {
        Self::all()
            .iter()
            .copied()
            .filter(move |k| k.section() == section)
    }

    /// Accepted values, for help output.
    pub fn hint(&self) -> &'static str {
        match self {
            ConfigKey::BrowserSensor => "sensor name, see `glovis sensors`",
            ConfigKey::BrowserGridSize => "odd number, 1 to 9",
            ConfigKey::BrowserBaseUrl => "http or https URL",
            ConfigKey::FilterMaxCloudCover => "percent, 0 to 100",
            ConfigKey::FilterMinQuality => "0 to 9",
            ConfigKey::FilterDataVersion => "version name or All",
            ConfigKey::FilterStartYear | ConfigKey::FilterEndYear => "year, empty for open",
            ConfigKey::FilterStartMonth | ConfigKey::FilterEndMonth => "0 (Jan) to 11 (Dec)",
            ConfigKey::FilterDownloadableOnly => "true or false",
            ConfigKey::LoggingLevel => "trace, debug, info, warn or error",
            ConfigKey::LoggingDirectory => "directory, empty for console only",
        }
    }

    /// Restore the built-in default value.
    pub fn reset(&self, config: &mut ConfigFile) {
        let defaults = ConfigFile::default();
        let (b, f, l) = (defaults.browser, defaults.filter, defaults.logging);
        match self {
            ConfigKey::BrowserSensor => config.browser.sensor = b.sensor,
            ConfigKey::BrowserGridSize => config.browser.grid_size = b.grid_size,
            ConfigKey::BrowserBaseUrl => config.browser.base_url = b.base_url,
            ConfigKey::FilterMaxCloudCover => config.filter.max_cloud_cover = f.max_cloud_cover,
            ConfigKey::FilterMinQuality => config.filter.min_quality = f.min_quality,
            ConfigKey::FilterDataVersion => config.filter.data_version = f.data_version,
            ConfigKey::FilterStartYear => config.filter.start_year = f.start_year,
            ConfigKey::FilterEndYear => config.filter.end_year = f.end_year,
            ConfigKey::FilterStartMonth => config.filter.start_month = f.start_month,
            ConfigKey::FilterEndMonth => config.filter.end_month = f.end_month,
            ConfigKey::FilterDownloadableOnly => {
                config.filter.downloadable_only = f.downloadable_only
            }
            ConfigKey::LoggingLevel => config.logging.level = l.level,
            ConfigKey::LoggingDirectory => config.logging.directory = l.directory,
        }
    }

    /// Current value as it would be written to the file.
    pub fn get(&self, config: &ConfigFile) -> String {
        let b = &config.browser;
        let f = &config.filter;
        let l = &config.logging;
        match self {
            ConfigKey::BrowserSensor => b.sensor.to_string(),
            ConfigKey::BrowserGridSize => b.grid_size.to_string(),
            ConfigKey::BrowserBaseUrl => b.base_url.clone(),
            ConfigKey::FilterMaxCloudCover => f.max_cloud_cover.to_string(),
            ConfigKey::FilterMinQuality => f.min_quality.to_string(),
            ConfigKey::FilterDataVersion => f.data_version.clone(),
            ConfigKey::FilterStartYear => optional(f.start_year),
            ConfigKey::FilterEndYear => optional(f.end_year),
            ConfigKey::FilterStartMonth => f.start_month.to_string(),
            ConfigKey::FilterEndMonth => f.end_month.to_string(),
            ConfigKey::FilterDownloadableOnly => f.downloadable_only.to_string(),
            ConfigKey::LoggingLevel => l.level.clone(),
            ConfigKey::LoggingDirectory => l
                .directory
                .as_ref()
                .map(|d| d.display().to_string())
                .unwrap_or_default(),
        }
    }

    /// Validate `value` and store it.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> ConfigResult<()> {
        let value = value.trim();
        let invalid = |reason: &str| ConfigError::InvalidValue {
            key: self.name().to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        };

        match self {
            ConfigKey::BrowserSensor => {
                config.browser.sensor =
                    SensorKind::from_name(value).ok_or_else(|| invalid("unknown sensor"))?;
            }
            ConfigKey::BrowserGridSize => {
                let size: usize = value.parse().map_err(|_| invalid("expected a number"))?;
                if size == 0 || size > MAX_GRID_SIZE || size % 2 == 0 {
                    return Err(invalid("expected an odd size from 1 to 9"));
                }
                config.browser.grid_size = size;
            }
            ConfigKey::BrowserBaseUrl => {
                if !(value.starts_with("http://") || value.starts_with("https://")) {
                    return Err(invalid("expected an http or https URL"));
                }
                config.browser.base_url = value.trim_end_matches('/').to_string();
            }
            ConfigKey::FilterMaxCloudCover => {
                config.filter.max_cloud_cover =
                    parse_bounded(value, 100).ok_or_else(|| invalid("expected 0 to 100"))?;
            }
            ConfigKey::FilterMinQuality => {
                config.filter.min_quality =
                    parse_bounded(value, 9).ok_or_else(|| invalid("expected 0 to 9"))?;
            }
            ConfigKey::FilterDataVersion => {
                if value.is_empty() {
                    return Err(invalid("expected a version or 'All'"));
                }
                config.filter.data_version = value.to_string();
            }
            ConfigKey::FilterStartYear => {
                config.filter.start_year =
                    parse_year(value).map_err(|_| invalid("expected a year"))?;
            }
            ConfigKey::FilterEndYear => {
                config.filter.end_year =
                    parse_year(value).map_err(|_| invalid("expected a year"))?;
            }
            ConfigKey::FilterStartMonth => {
                config.filter.start_month =
                    parse_bounded(value, 11).ok_or_else(|| invalid("expected 0 to 11"))?;
            }
            ConfigKey::FilterEndMonth => {
                config.filter.end_month =
                    parse_bounded(value, 11).ok_or_else(|| invalid("expected 0 to 11"))?;
            }
            ConfigKey::FilterDownloadableOnly => {
                config.filter.downloadable_only =
                    parse_bool(value).ok_or_else(|| invalid("expected true or false"))?;
            }
            ConfigKey::LoggingLevel => {
                let level = value.to_lowercase();
                if !LOG_LEVELS.contains(&level.as_str()) {
                    return Err(invalid("expected trace, debug, info, warn or error"));
                }
                config.logging.level = level;
            }
            ConfigKey::LoggingDirectory => {
                config.logging.directory = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
        }
        Ok(())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ConfigKey::all()
            .iter()
            .copied()
            .find(|k| k.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn optional(value: Option<i32>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn parse_bounded<T>(value: &str, max: T) -> Option<T>
where
    T: FromStr + PartialOrd,
{
    value.parse::<T>().ok().filter(|v| *v <= max)
}

fn parse_year(value: &str) -> Result<Option<i32>, std::num::ParseIntError> {
    if value.is_empty() {
        Ok(None)
    } else {
        value.parse().map(Some)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}
