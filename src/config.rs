//! Configuration file support for the station controller.
//!
//! Every setting has a compiled-in default matching the station server, so a
//! configuration file is optional. Natively it lives in the user configuration
//! directory; in the browser an override may be kept in localStorage.

use serde::{Deserialize, Serialize};
#[cfg(not(target_arch = "wasm32"))]
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{DEFAULT_PREVIEW_PERIOD_MS, DEFAULT_TRAINING_SETTLE_MS, paths};
use crate::keybindings::NavigationKeys;
use crate::model::{RacePhase, StatusTable};
use crate::storage::KeyValueStore;

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    pub fn to_level(self) -> log::Level {
        match self {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }

    pub fn to_level_filter(self) -> log::LevelFilter {
        self.to_level().to_level_filter()
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// How the live preview is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PreviewMode {
    /// Poll single camera frames on a fixed interval
    #[default]
    Polling,
    /// Show the continuous MJPEG stream
    Stream,
}

/// Live preview section of the config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewConfig {
    #[serde(default)]
    pub mode: PreviewMode,

    /// Refresh period in polling mode
    #[serde(default = "default_preview_period_ms")]
    pub period_ms: u64,
}

fn default_preview_period_ms() -> u64 {
    DEFAULT_PREVIEW_PERIOD_MS
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            mode: PreviewMode::default(),
            period_ms: default_preview_period_ms(),
        }
    }
}

/// Server paths used by the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub start_race: String,
    pub stop_race: String,
    /// Image count endpoint; the race id is appended as `?race=<id>`
    pub image_count: String,
    pub camera: String,
    pub video_stream: String,
    /// Directory holding `<race>/image_NNNN.jpg`
    pub race_root: String,
    /// Placeholder shown while a race runs
    pub active_race_image: String,
    /// Placeholder shown after pressing ready
    pub ready_image: String,
    /// Push channel path, relative to the page origin
    pub push_socket: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            start_race: paths::START_RACE.to_string(),
            stop_race: paths::STOP_RACE.to_string(),
            image_count: paths::IMAGE_COUNT.to_string(),
            camera: paths::CAMERA.to_string(),
            video_stream: paths::VIDEO_STREAM.to_string(),
            race_root: paths::RACE_ROOT.to_string(),
            active_race_image: paths::ACTIVE_RACE_IMAGE.to_string(),
            ready_image: paths::READY_IMAGE.to_string(),
            push_socket: paths::PUSH_SOCKET.to_string(),
        }
    }
}

/// Extra status token mapping, merged over the built-in table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTokenConfig {
    pub token: String,
    pub phase: RacePhase,
}

/// Station controller configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationConfig {
    /// Version of the configuration file format
    pub version: u32,

    #[serde(default)]
    pub endpoints: EndpointConfig,

    #[serde(default)]
    pub preview: PreviewConfig,

    /// Delay between reaching "not ready" and the next start in training mode
    #[serde(default = "default_training_settle_ms")]
    pub training_settle_ms: u64,

    /// Additional race status tokens
    #[serde(default)]
    pub status_tokens: Vec<StatusTokenConfig>,

    #[serde(default)]
    pub navigation_keys: NavigationKeys,

    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,
}

fn default_training_settle_ms() -> u64 {
    DEFAULT_TRAINING_SETTLE_MS
}

impl StationConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            endpoints: EndpointConfig::default(),
            preview: PreviewConfig::default(),
            training_settle_ms: default_training_settle_ms(),
            status_tokens: Vec::new(),
            navigation_keys: NavigationKeys::default(),
            log_level: LogLevel::default(),
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize and validate configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }
        if config.preview.period_ms == 0 {
            return Err(ConfigError::Invalid(
                "preview.period_ms must be greater than zero".to_string(),
            ));
        }
        if config.navigation_keys.has_conflict() {
            return Err(ConfigError::Invalid(format!(
                "navigation keys share the key '{}'",
                config.navigation_keys.next
            )));
        }

        Ok(config)
    }

    /// Built-in status tokens with the configured extras merged on top.
    pub fn status_table(&self) -> StatusTable {
        let mut table = StatusTable::default();
        for extra in &self.status_tokens {
            table.insert(&extra.token, extra.phase);
        }
        table
    }

    pub fn preview_period(&self) -> Duration {
        Duration::from_millis(self.preview.period_ms)
    }

    pub fn training_settle_delay(&self) -> Duration {
        Duration::from_millis(self.training_settle_ms)
    }

    /// File name of the native configuration file.
    pub const FILE_NAME: &'static str = "photofinish.json";

    /// Key of the override configuration in browser storage.
    pub const STORAGE_KEY: &'static str = "photofinish-config";

    /// `<config dir>/photofinish/photofinish.json`, or `None` without a home.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .map(|dir| dir.join("photofinish").join(Self::FILE_NAME))
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Resolve the configuration of a native run.
    ///
    /// An explicit path must load. The default location is optional: a missing
    /// or broken file there falls back to the compiled-in defaults.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            let config = Self::load_from_path(path)?;
            log::info!("⚙️  Configuration from {:?}", path);
            return Ok(config);
        }

        let Some(path) = Self::default_path().filter(|p| p.exists()) else {
            log::debug!("No configuration file, using defaults");
            return Ok(Self::default());
        };
        match Self::load_from_path(&path) {
            Ok(config) => {
                log::info!("⚙️  Configuration from {:?}", path);
                Ok(config)
            }
            Err(e) => {
                log::warn!("⚠️  Ignoring {:?}: {}", path, e);
                Ok(Self::default())
            }
        }
    }

    /// Write this configuration to `path`, creating parent directories.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn write_to_path(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Load the override configuration kept in `store`, if there is a valid one.
    pub fn load_from_store<S: KeyValueStore>(store: &S) -> Option<Self> {
        let json = match store.get_item(Self::STORAGE_KEY) {
            Ok(json) => json?,
            Err(e) => {
                log::warn!("⚠️  Could not read stored configuration: {}", e);
                return None;
            }
        };
        match Self::from_json(&json) {
            Ok(config) => {
                log::info!("⚙️  Using stored configuration");
                Some(config)
            }
            Err(e) => {
                log::warn!("⚠️  Ignoring stored configuration: {}", e);
                None
            }
        }
    }
}

impl Default for StationConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// A setting has an unusable value
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Options taken from the page URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageOptions {
    /// `training=true`: restart the race automatically after every reset
    pub training: bool,
}

impl PageOptions {
    /// Parse a query string such as `?training=true&foo=bar`.
    pub fn from_query(query: &str) -> Self {
        let training = query
            .trim_start_matches('?')
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .any(|(key, value)| key == "training" && value == "true");
        Self { training }
    }
}
