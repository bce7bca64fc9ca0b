//! Engine configuration
//!
//! Read from `~/.beehouse/config.yaml` (or the file named by
//! `BEEHOUSE_CONFIG`), then overridden by environment variables. A missing
//! file means defaults.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{HiveError, HiveResult};
use crate::telemetry::IndicatorType;

/// Environment variable naming an alternative config file
pub const CONFIG_PATH_ENV: &str = "BEEHOUSE_CONFIG";
/// Environment override for the high-production threshold (grams)
pub const HIGH_THRESHOLD_ENV: &str = "BEEHOUSE_HIGH_PRODUCTION_THRESHOLD";
/// Environment override for the low-production threshold (grams)
pub const LOW_THRESHOLD_ENV: &str = "BEEHOUSE_LOW_PRODUCTION_THRESHOLD";

/// Default high-production threshold in grams
pub const DEFAULT_HIGH_PRODUCTION_THRESHOLD: f64 = 5000.0;
/// Default low-production threshold in grams
pub const DEFAULT_LOW_PRODUCTION_THRESHOLD: f64 = 1000.0;

/// Inclusive range of normal values. An open side is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

impl Bounds {
    pub fn between(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn at_least(min: f64) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }

    fn validate(&self, indicator: IndicatorType) -> HiveResult<()> {
        let finite = self.min.map_or(true, f64::is_finite) && self.max.map_or(true, f64::is_finite);
        let ordered = match (self.min, self.max) {
            (Some(min), Some(max)) => min <= max,
            _ => true,
        };
        if !finite || !ordered {
            return Err(HiveError::Config(format!(
                "invalid bounds for {}: {:?}",
                indicator, self
            )));
        }
        Ok(())
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Advisory normal ranges per indicator. Indicators without an entry are
    /// never abnormal.
    pub sensor_bounds: HashMap<IndicatorType, Bounds>,
    /// Threshold used by high-production queries when none is given
    pub high_production_threshold: f64,
    /// Threshold used by low-production queries when none is given
    pub low_production_threshold: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sensor_bounds: HashMap::from([
                (IndicatorType::TemperatureInside, Bounds::between(10.0, 50.0)),
                (IndicatorType::HumidityInside, Bounds::between(20.0, 90.0)),
                (IndicatorType::Weight, Bounds::at_least(0.0)),
            ]),
            high_production_threshold: DEFAULT_HIGH_PRODUCTION_THRESHOLD,
            low_production_threshold: DEFAULT_LOW_PRODUCTION_THRESHOLD,
        }
    }
}

/// Get the beehouse config directory
pub fn get_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".beehouse")
}

/// Get the config file path, honouring `BEEHOUSE_CONFIG`
pub fn get_config_file() -> PathBuf {
    std::env::var(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| get_config_dir().join("config.yaml"))
}

fn parse_threshold(var: &str) -> HiveResult<Option<f64>> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|e| HiveError::Config(format!("{}={:?} is not a number: {}", var, raw, e))),
        Err(_) => Ok(None),
    }
}

impl EngineConfig {
    /// Load from the default location with environment overrides
    pub fn load() -> HiveResult<Self> {
        Self::load_from(&get_config_file())
    }

    /// Load from `path` with environment overrides. A missing file yields
    /// defaults.
    pub fn load_from(path: &Path) -> HiveResult<Self> {
        let mut config = if path.exists() {
            let raw = fs::read_to_string(path)
                .map_err(|e| HiveError::Config(format!("failed to read {}: {}", path.display(), e)))?;
            Self::parse_yaml(&raw)?
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Self::default()
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse YAML without consulting the environment
    pub fn from_yaml(raw: &str) -> HiveResult<Self> {
        let config = Self::parse_yaml(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn parse_yaml(raw: &str) -> HiveResult<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw).map_err(|e| HiveError::Config(format!("invalid YAML: {}", e)))
    }

    fn apply_env_overrides(&mut self) -> HiveResult<()> {
        if let Some(high) = parse_threshold(HIGH_THRESHOLD_ENV)? {
            self.high_production_threshold = high;
        }
        if let Some(low) = parse_threshold(LOW_THRESHOLD_ENV)? {
            self.low_production_threshold = low;
        }
        Ok(())
    }

    pub fn validate(&self) -> HiveResult<()> {
        for (indicator, bounds) in &self.sensor_bounds {
            bounds.validate(*indicator)?;
        }
        for (name, value) in [
            ("high_production_threshold", self.high_production_threshold),
            ("low_production_threshold", self.low_production_threshold),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(HiveError::Config(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    pub fn bounds_for(&self, indicator: IndicatorType) -> Option<&Bounds> {
        self.sensor_bounds.get(&indicator)
    }
}
