use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::geo::Coordinate;

/// Environment variable that overrides `geocoder.api_key`
pub const GEOCODER_KEY_ENV: &str = "MAPMARK_GEOCODER_KEY";

/// System set for config loading (other plugins can run after this)
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigLoaded;

/// Reverse geocoder connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocoderSettings {
    #[serde(default = "default_geocoder_endpoint")]
    pub endpoint: String,

    /// API key; lookups are disabled while this is missing
    #[serde(default)]
    pub api_key: Option<String>,

    /// Response language, e.g. `ru_RU` or `en_US`
    #[serde(default = "default_geocoder_language")]
    pub language: String,

    #[serde(default = "default_geocoder_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_geocoder_endpoint() -> String {
    "https://geocode-maps.yandex.ru/1.x/".to_string()
}

fn default_geocoder_language() -> String {
    "ru_RU".to_string()
}

fn default_geocoder_timeout_secs() -> u64 {
    10
}

impl Default for GeocoderSettings {
    fn default() -> Self {
        Self {
            endpoint: default_geocoder_endpoint(),
            api_key: None,
            language: default_geocoder_language(),
            timeout_secs: default_geocoder_timeout_secs(),
        }
    }
}

impl GeocoderSettings {
    /// API key from the environment, falling back to the config file. Blank keys count as missing.
    pub fn resolved_api_key(&self) -> Option<String> {
        let from_env = std::env::var(GEOCODER_KEY_ENV).ok();
        from_env
            .or_else(|| self.api_key.clone())
            .filter(|key| !key.trim().is_empty())
    }
}

/// Where the map camera looks when the app starts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StartView {
    pub center: Coordinate,
    pub zoom: f64,
}

impl Default for StartView {
    fn default() -> Self {
        Self {
            center: Coordinate::new(55.751244, 37.618423),
            zoom: 10.0,
        }
    }
}

/// Application configuration persisted to disk
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfigData {
    #[serde(default)]
    pub geocoder: GeocoderSettings,

    #[serde(default)]
    pub start_view: StartView,
}

/// Runtime configuration resource
#[derive(Resource)]
pub struct AppConfig {
    /// The persisted configuration data
    pub data: AppConfigData,
    /// Path to the config file
    pub config_path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data: AppConfigData::default(),
            config_path: get_config_path(),
        }
    }
}

/// Resource to notify user when config was reset to defaults
#[derive(Resource, Default)]
pub struct ConfigResetNotification {
    /// Whether to show the notification dialog
    pub show: bool,
    /// The reason for the reset (parse error, read error, etc.)
    pub reason: Option<String>,
}

/// Get the path to the config file (platform-appropriate location)
fn get_config_path() -> PathBuf {
    crate::paths::config_file()
}

/// Result of loading config from disk
struct LoadConfigResult {
    data: AppConfigData,
    /// Error message if config was reset to defaults due to an error
    reset_reason: Option<String>,
    /// Whether there was no config file yet
    first_run: bool,
}

/// Parse config file contents
fn parse_config(json: &str) -> Result<AppConfigData, String> {
    serde_json::from_str(json).map_err(|e| format!("Configuration file was corrupted: {}", e))
}

/// Load configuration from disk
fn load_config(config_path: &Path) -> LoadConfigResult {
    if !config_path.exists() {
        info!("No config file found, using defaults");
        return LoadConfigResult {
            data: AppConfigData::default(),
            reset_reason: None,
            first_run: true,
        };
    }

    let (data, reset_reason) = match std::fs::read_to_string(config_path) {
        Ok(json) => match parse_config(&json) {
            Ok(data) => {
                info!("Loaded config from {:?}", config_path);
                (data, None)
            }
            Err(reason) => {
                warn!("Failed to parse config file: {}", reason);
                (AppConfigData::default(), Some(reason))
            }
        },
        Err(e) => {
            warn!("Failed to read config file: {}", e);
            (
                AppConfigData::default(),
                Some(format!("Could not read configuration file: {}", e)),
            )
        }
    };

    LoadConfigResult {
        data,
        reset_reason,
        first_run: false,
    }
}

/// Save configuration to disk
fn save_config(config: &AppConfig) {
    match serde_json::to_string_pretty(&config.data) {
        Ok(json) => {
            if let Err(e) = std::fs::write(&config.config_path, json) {
                error!("Failed to save config: {}", e);
            } else {
                info!("Config saved to {:?}", config.config_path);
            }
        }
        Err(e) => {
            error!("Failed to serialize config: {}", e);
        }
    }
}

/// Startup system to load config from disk into the existing resource
fn load_config_system(
    mut config: ResMut<AppConfig>,
    mut reset_notification: ResMut<ConfigResetNotification>,
) {
    let result = load_config(&config.config_path);
    config.data = result.data;

    // Write a template on first run so the API key has somewhere to go
    if result.first_run {
        save_config(&config);
    }

    if let Some(reason) = result.reset_reason {
        reset_notification.show = true;
        reset_notification.reason = Some(reason);
    }
}

/// Startup system to warn early when reverse geocoding cannot work
fn check_geocoder_key(config: Res<AppConfig>) {
    if config.data.geocoder.resolved_api_key().is_none() {
        warn!(
            "No geocoder API key configured (set geocoder.api_key in {:?} or {}); \
             addresses will not be looked up",
            config.config_path, GEOCODER_KEY_ENV
        );
    }
}

pub struct ConfigPlugin;

impl Plugin for ConfigPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AppConfig>()
            .init_resource::<ConfigResetNotification>()
            .add_systems(
                Startup,
                (load_config_system, check_geocoder_key)
                    .chain()
                    .in_set(ConfigLoaded),
            );
    }
}
