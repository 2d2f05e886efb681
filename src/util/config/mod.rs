//! Runner configuration
//!
//! Settings are read from a TOML file; every field is optional and falls
//! back to its default.
//!
//! ```toml
//! [clock]
//! time_scale = 1.0
//! max_delta_ms = 333
//!
//! [driver]
//! cadence_hz = 60
//!
//! [log]
//! level = "info"
//! ```
//!
//! # Usage
//!
//! ```rust
//! use phase_routines::util::config::RoutinesConfig;
//!
//! let config = RoutinesConfig::from_toml_str("[driver]\ncadence_hz = 30\n").unwrap();
//! assert_eq!(config.driver.cadence_hz, 30);
//! ```


use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::runtime::clock::{is_valid_scale, FrameClock};
use crate::util::logger::LogLevel;

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RoutinesConfig {
    /// Clock settings
    #[serde(default)]
    pub clock: ClockConfig,
    /// Frame driver settings
    #[serde(default)]
    pub driver: DriverConfig,
    /// Logging settings
    #[serde(default)]
    pub log: LogConfig,
}

/// Clock configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClockConfig {
    /// Multiplier applied to scaled time
    #[serde(default = "default_time_scale")]
    pub time_scale: f64,
    /// Upper bound for a single frame's delta, in milliseconds
    #[serde(default = "default_max_delta_ms")]
    pub max_delta_ms: u64,
}

fn default_time_scale() -> f64 {
    1.0
}

fn default_max_delta_ms() -> u64 {
    333
}

impl ClockConfig {
    /// `max_delta_ms` as a duration.
    pub fn max_delta(&self) -> Duration {
        Duration::from_millis(self.max_delta_ms)
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            max_delta_ms: 333,
        }
    }
}

/// Frame driver configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Cycles per second when running in real time
    #[serde(default = "default_cadence_hz")]
    pub cadence_hz: u32,
}

fn default_cadence_hz() -> u32 {
    60
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self { cadence_hz: 60 }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LogConfig {
    /// Minimum level emitted
    #[serde(default)]
    pub level: LogLevel,
}

impl RoutinesConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: RoutinesConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the runtime cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_scale(self.clock.time_scale) {
            return Err(ConfigError::Invalid(format!(
                "clock.time_scale must be within 0..={}, got {}",
                FrameClock::MAX_TIME_SCALE,
                self.clock.time_scale
            )));
        }
        if self.clock.max_delta_ms == 0 {
            return Err(ConfigError::Invalid(
                "clock.max_delta_ms must be positive".to_string(),
            ));
        }
        if self.driver.cadence_hz == 0 {
            return Err(ConfigError::Invalid(
                "driver.cadence_hz must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load configuration from `path`.
pub fn load_config(path: &Path) -> Result<RoutinesConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    RoutinesConfig::from_toml_str(&content)
}

/// Load configuration from `path`, or the defaults if it does not exist.
pub fn load_config_or_default(path: &Path) -> Result<RoutinesConfig, ConfigError> {
    if !path.exists() {
        return Ok(RoutinesConfig::default());
    }
    load_config(path)
}

/// Write configuration to `path`, creating parent directories.
pub fn save_config(
    path: &Path,
    config: &RoutinesConfig,
) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            fs::create_dir_all(dir)?;
        }
    }

    let content = toml::to_string_pretty(config)?;
    fs::write(path, content)?;

    Ok(())
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}
