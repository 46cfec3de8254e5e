//! Configuration file support for Cyclefit.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/cyclefit/config.toml`.

use crate::engine::CycleSettings;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub cycle: CycleConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Cycle geometry defaults used until the user's own history says otherwise
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CycleConfig {
    /// Fallback cycle length when no valid samples exist
    #[serde(default = "default_cycle_length")]
    pub default_cycle_length: u32,

    #[serde(default = "default_period_length")]
    pub period_length: u32,

    /// Assumed days from ovulation to the next period start
    #[serde(default = "default_luteal_length")]
    pub luteal_length: u32,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            default_cycle_length: default_cycle_length(),
            period_length: default_period_length(),
            luteal_length: default_luteal_length(),
        }
    }
}

impl CycleConfig {
    /// Settings for the cycle engine, before any per-user onboarding values
    pub fn settings(&self) -> CycleSettings {
        CycleSettings {
            fallback_cycle_length: self.default_cycle_length,
            period_length: self.period_length,
            luteal_length: self.luteal_length,
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("cyclefit")
}

fn default_cycle_length() -> u32 {
    28
}

fn default_period_length() -> u32 {
    5
}

fn default_luteal_length() -> u32 {
    14
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("cyclefit").join("config.toml")
    }

    /// Check that the cycle geometry is usable
    pub fn validate(&self) -> Result<()> {
        self.cycle.settings().validate()
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
