use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::buffer::DEFAULT_CAPACITY;
use crate::intel::{DEFAULT_IDLE_TIMEOUT, DEFAULT_MAX_LOOKUP_ENTRIES};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub buffer: BufferConfig,

    #[serde(default)]
    pub intel: IntelConfig,
}

impl Config {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;

        Ok(config)
    }

    /// Load config from default locations or create default
    pub fn load_or_default() -> Result<Self> {
        let paths = [
            PathBuf::from("/etc/conntrail/config.toml"),
            dirs_next::config_dir()
                .map(|p| p.join("conntrail/config.toml"))
                .unwrap_or_default(),
            PathBuf::from("config.toml"),
        ];

        for path in &paths {
            if path.exists() {
                return Self::load(path);
            }
        }

        Ok(Self::default())
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Get the storage directory path
    pub fn storage_dir(&self) -> PathBuf {
        PathBuf::from(&self.general.storage_dir)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory for durable storage
    #[serde(default = "default_storage_dir")]
    pub storage_dir: String,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            storage_dir: default_storage_dir(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BufferConfig {
    /// Lines kept in the stream window
    #[serde(default = "default_buffer_capacity")]
    pub capacity: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            capacity: default_buffer_capacity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntelConfig {
    /// Bound on cached lookup outcomes
    #[serde(default = "default_max_lookup_entries")]
    pub max_lookup_entries: usize,

    /// Idle seconds before cached intelligence state is dropped
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
}

impl Default for IntelConfig {
    fn default() -> Self {
        Self {
            max_lookup_entries: default_max_lookup_entries(),
            idle_timeout_secs: default_idle_timeout_secs(),
        }
    }
}

// Default value functions
fn default_storage_dir() -> String {
    "./conntrail-data".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_buffer_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_max_lookup_entries() -> usize {
    DEFAULT_MAX_LOOKUP_ENTRIES
}

fn default_idle_timeout_secs() -> u64 {
    DEFAULT_IDLE_TIMEOUT.as_secs()
}
