//! Configuration for Kestrel.
//!
//! Stored as TOML at `~/.kestrel/config.toml` by default. The path can be
//! overridden with `KESTREL_CONFIG_PATH`, and individual values with the
//! `KESTREL_*` variables listed below.
//!
//! ```toml
//! [general]
//! log_level = "info"
//!
//! [learning]
//! normal_rate = 0.1
//! training_rate = 0.3
//!
//! [simulation]
//! tick_interval_ms = 1000
//! assignment_interval_ms = 2000
//! auto_start = true
//! seed_demo = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{KestrelError, Result};

// Environment variable names
pub const ENV_CONFIG_PATH: &str = "KESTREL_CONFIG_PATH";
pub const ENV_LOG_LEVEL: &str = "KESTREL_LOG_LEVEL";
pub const ENV_TRAINING_RATE: &str = "KESTREL_TRAINING_RATE";
pub const ENV_TICK_MS: &str = "KESTREL_TICK_MS";

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct KestrelConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub learning: LearningConfig,

    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// General settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Learning rates applied to every agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningConfig {
    /// Rate outside training mode
    pub normal_rate: f64,

    /// Rate while training mode is on
    pub training_rate: f64,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            normal_rate: 0.1,
            training_rate: 0.3,
        }
    }
}

/// Driver loop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Interval between simulated execution ticks
    pub tick_interval_ms: u64,

    /// Interval between assignment cycles
    pub assignment_interval_ms: u64,

    /// Start the simulation as soon as the driver comes up
    pub auto_start: bool,

    /// Seed demo agents, tasks and devices on startup
    pub seed_demo: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            assignment_interval_ms: 2000,
            auto_start: true,
            seed_demo: true,
        }
    }
}

impl KestrelConfig {
    /// Default config file location, honoring `KESTREL_CONFIG_PATH`
    pub fn config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(ENV_CONFIG_PATH) {
            return Ok(PathBuf::from(path));
        }

        let home = dirs::home_dir()
            .ok_or_else(|| KestrelError::config("Could not determine home directory"))?;
        Ok(home.join(".kestrel").join("config.toml"))
    }

    /// Load from the default location, falling back to defaults if the file
    /// does not exist. Environment overrides apply either way.
    pub fn load_or_default() -> Result<Self> {
        Self::load_or_default_from(&Self::config_path()?)
    }

    /// Like [`load_or_default`](Self::load_or_default) for an explicit path
    pub fn load_or_default_from(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from_path(path)
        } else {
            debug!("No configuration at {}, using defaults", path.display());
            let mut config = Self::default();
            config.merge_env_vars()?;
            config.validate()?;
            Ok(config)
        }
    }

    /// Load, apply environment overrides and validate
    pub fn load_from_path(path: &Path) -> Result<Self> {
        debug!("Loading configuration from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .map_err(|e| KestrelError::config(format!("Failed to read config file: {}", e)))?;

        let mut config: Self = toml::from_str(&content)
            .map_err(|e| KestrelError::config(format!("Failed to parse config file: {}", e)))?;

        config.merge_env_vars()?;
        config.validate()?;

        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Validate and write atomically (temp file, then rename)
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    KestrelError::config(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        let content = self.to_toml()?;
        let temp_path = path.with_extension("toml.tmp");

        std::fs::write(&temp_path, content)
            .map_err(|e| KestrelError::config(format!("Failed to write config file: {}", e)))?;
        std::fs::rename(&temp_path, path)
            .map_err(|e| KestrelError::config(format!("Failed to rename config file: {}", e)))?;

        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Render as pretty TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| KestrelError::config(format!("Failed to serialize config: {}", e)))
    }

    /// Reject unknown log levels and learning rates outside (0, 1]
    pub fn validate(&self) -> Result<()> {
        if !VALID_LOG_LEVELS.contains(&self.general.log_level.as_str()) {
            return Err(KestrelError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.general.log_level,
                VALID_LOG_LEVELS.join(", ")
            )));
        }

        for (name, rate) in [
            ("normal_rate", self.learning.normal_rate),
            ("training_rate", self.learning.training_rate),
        ] {
            if !(rate > 0.0 && rate <= 1.0) {
                return Err(KestrelError::config(format!(
                    "{} must be in (0, 1], got {}",
                    name, rate
                )));
            }
        }

        if self.simulation.tick_interval_ms == 0 || self.simulation.assignment_interval_ms == 0 {
            return Err(KestrelError::config("Simulation intervals must be greater than 0"));
        }

        Ok(())
    }

    /// Apply `KESTREL_*` overrides from the process environment
    pub fn merge_env_vars(&mut self) -> Result<()> {
        self.merge_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup
    pub fn merge_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(log_level) = lookup(ENV_LOG_LEVEL) {
            debug!("Overriding log_level from environment: {}", log_level);
            self.general.log_level = log_level;
        }

        if let Some(rate) = lookup(ENV_TRAINING_RATE) {
            self.learning.training_rate = rate.parse().map_err(|_| {
                KestrelError::config(format!("Invalid {} value: {}", ENV_TRAINING_RATE, rate))
            })?;
        }

        if let Some(tick) = lookup(ENV_TICK_MS) {
            self.simulation.tick_interval_ms = tick.parse().map_err(|_| {
                KestrelError::config(format!("Invalid {} value: {}", ENV_TICK_MS, tick))
            })?;
        }

        Ok(())
    }
}
