//! The `trailnote-config.json` settings file.
//!
//! Every section has serde defaults, so a file only needs `version` and the
//! keys the user actually changed. Files written by a newer release are
//! refused rather than silently misread.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_MAX_HISTORY, DEFAULT_PREVIEW_INTERVAL_MS, DEFAULT_SIMPLIFY_TOLERANCE};
use crate::geometry::SimplifyOptions;
use crate::model::{RouteStyle, TileLayer};
use crate::quota::QuotaPolicy;

/// Verbosity of the `log` output, stored in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Failures only
    Error,
    /// Failures and rejected operations (quota, busy features)
    Warn,
    /// Also confirmed mutations and project loads
    #[default]
    Info,
    /// Also request lifecycle and layer rebuilds
    Debug,
    /// Everything
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        use log::LevelFilter;
        match self {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Format version written to new files.
pub const CONFIG_VERSION: u32 = 1;

/// All settings, one section per concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub version: u32,

    #[serde(default = "default_app_name")]
    pub app_name: String,

    #[serde(default)]
    pub preferences: UserPreferences,

    /// Freehand capture settings
    #[serde(default)]
    pub capture: CaptureConfig,

    /// Subscription limits per tier
    #[serde(default)]
    pub quota: QuotaPolicy,

    /// Undo history settings
    #[serde(default)]
    pub history: HistoryConfig,
}

fn default_app_name() -> String {
    "TrailNote".to_string()
}

/// User preferences section of the config.
///
/// Style fields left empty fall back to the built-in route style.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Preferred color for new routes
    #[serde(default)]
    pub route_color: Option<String>,

    /// Preferred stroke width for new routes
    #[serde(default)]
    pub route_width: Option<f32>,

    /// Preferred opacity for new routes
    #[serde(default)]
    pub route_opacity: Option<f32>,

    /// Base map shown when a project opens
    #[serde(default)]
    pub tile_layer: TileLayer,

    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Read-only access to the user's defaults.
pub trait PreferenceSource {
    /// Style applied to newly drawn routes.
    fn route_style(&self) -> RouteStyle;
    /// Tile layer to show by default.
    fn tile_layer(&self) -> TileLayer;
}

impl PreferenceSource for UserPreferences {
    fn route_style(&self) -> RouteStyle {
        let fallback = RouteStyle::default();
        RouteStyle::new(
            self.route_color.clone().unwrap_or(fallback.color),
            self.route_width.unwrap_or(fallback.width),
            self.route_opacity.unwrap_or(fallback.opacity),
        )
    }

    fn tile_layer(&self) -> TileLayer {
        self.tile_layer
    }
}

/// Freehand capture section of the config.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Simplification tolerance in coordinate degrees
    #[serde(default = "default_tolerance")]
    pub simplify_tolerance: f64,

    /// Favor shape fidelity over point reduction
    #[serde(default = "default_high_quality")]
    pub high_quality: bool,

    /// Minimum time between live preview redraws
    #[serde(default = "default_preview_interval_ms")]
    pub preview_interval_ms: u64,
}

fn default_tolerance() -> f64 {
    DEFAULT_SIMPLIFY_TOLERANCE
}

fn default_high_quality() -> bool {
    true
}

fn default_preview_interval_ms() -> u64 {
    DEFAULT_PREVIEW_INTERVAL_MS
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            simplify_tolerance: default_tolerance(),
            high_quality: default_high_quality(),
            preview_interval_ms: default_preview_interval_ms(),
        }
    }
}

impl CaptureConfig {
    pub fn simplify_options(&self) -> SimplifyOptions {
        SimplifyOptions {
            tolerance: self.simplify_tolerance,
            high_quality: self.high_quality,
        }
    }

    pub fn preview_interval(&self) -> Duration {
        Duration::from_millis(self.preview_interval_ms)
    }
}

/// Undo history section of the config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Maximum number of commands to keep in history
    #[serde(default = "default_max_history")]
    pub max_history: usize,
}

fn default_max_history() -> usize {
    DEFAULT_MAX_HISTORY
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_history: default_max_history(),
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            app_name: default_app_name(),
            preferences: UserPreferences::default(),
            capture: CaptureConfig::default(),
            quota: QuotaPolicy::default(),
            history: HistoryConfig::default(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse a config file, refusing versions this build does not know.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }
        Ok(config)
    }

    pub fn default_filename() -> &'static str {
        "trailnote-config.json"
    }

    /// `<config dir>/trailnote/trailnote-config.json`, or under `~/.config`
    /// when the platform has no config directory.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn default_path() -> Option<std::path::PathBuf> {
        let base = dirs::config_dir().or_else(|| dirs::home_dir().map(|home| home.join(".config")))?;
        Some(base.join("trailnote").join(Self::default_filename()))
    }

    /// Read the config at [`Self::default_path`]. A missing or unreadable
    /// file yields `None`; the reason is logged.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            log::debug!("No config at {}", path.display());
            return None;
        }
        match Self::load_from(&path) {
            Ok(config) => Some(config),
            Err(e) => {
                log::warn!("Ignoring config at {}: {e}", path.display());
                None
            }
        }
    }

    /// Write the config to [`Self::default_path`]. Returns where it went.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to_default_path(&self) -> Result<std::path::PathBuf, ConfigError> {
        let path = Self::default_path().ok_or(ConfigError::NoConfigDir)?;
        self.save_to(&path)?;
        Ok(path)
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        let config = Self::from_json(&std::fs::read_to_string(path)?)?;
        log::info!("⚙️ Config loaded from {}", path.display());
        Ok(config)
    }

    /// Write the config as pretty JSON, creating missing parent directories.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, self.to_json()?)?;
        log::info!("⚙️ Config saved to {}", path.display());
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid config file: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Config version {file_version} is newer than this build supports ({supported_version})")]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    #[error("Config file I/O failed: {0}")]
    IoError(#[from] std::io::Error),

    #[error("No config directory on this platform")]
    NoConfigDir,
}
