//! Application-level configuration loading, including retention and game-code settings.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use time::Duration;
use tracing::{info, warn};

use crate::services::codes::DEFAULT_PREFIXES;

/// Default location on disk where the binary looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "SECRET_SANTA_CONFIG_PATH";

/// Default number of days a game is retained before automatic purge.
const DEFAULT_RETENTION_DAYS: u16 = 30;
/// Bounds applied to the configured retention window.
const MIN_RETENTION_DAYS: u16 = 1;
const MAX_RETENTION_DAYS: u16 = 365;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    auto_purge_enabled: bool,
    retention_days: u16,
    code_prefixes: Vec<String>,
    suffix_length: Option<usize>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the
    /// baked-in defaults when the file is missing or malformed.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        retention_days = config.retention_days,
                        auto_purge = config.auto_purge_enabled,
                        "loaded configuration"
                    );
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Whether expired games are purged automatically. When disabled, new
    /// games are created without an expiration instant.
    pub fn auto_purge_enabled(&self) -> bool {
        self.auto_purge_enabled
    }

    /// Retention window applied to newly created games.
    pub fn retention_window(&self) -> Duration {
        Duration::days(i64::from(self.retention_days))
    }

    /// Prefixes used when generating game codes.
    pub fn code_prefixes(&self) -> &[String] {
        &self.code_prefixes
    }

    /// Fixed suffix length for generated codes, or `None` for a random one.
    pub fn suffix_length(&self) -> Option<usize> {
        self.suffix_length
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            auto_purge_enabled: true,
            retention_days: DEFAULT_RETENTION_DAYS,
            code_prefixes: DEFAULT_PREFIXES.iter().map(|s| s.to_string()).collect(),
            suffix_length: None,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    auto_purge_enabled: Option<bool>,
    retention_days: Option<u16>,
    code_prefixes: Option<Vec<String>>,
    suffix_length: Option<usize>,
}

impl From<RawConfig> for AppConfig {
    fn from(raw: RawConfig) -> Self {
        let defaults = AppConfig::default();

        let retention_days = raw
            .retention_days
            .map(|days| days.clamp(MIN_RETENTION_DAYS, MAX_RETENTION_DAYS))
            .unwrap_or(defaults.retention_days);

        let code_prefixes = match raw.code_prefixes {
            Some(prefixes) => {
                let cleaned: Vec<String> = prefixes
                    .into_iter()
                    .map(|prefix| prefix.trim().to_ascii_uppercase())
                    .filter(|prefix| !prefix.is_empty())
                    .collect();
                if cleaned.is_empty() {
                    defaults.code_prefixes
                } else {
                    cleaned
                }
            }
            None => defaults.code_prefixes,
        };

        Self {
            auto_purge_enabled: raw.auto_purge_enabled.unwrap_or(defaults.auto_purge_enabled),
            retention_days,
            code_prefixes,
            suffix_length: raw.suffix_length,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
