//! Configuration management for scan candidates and port suggestions.
//!
//! Stores configuration in JSON format at `~/.portprobe/config.json`.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::PortRange;
use crate::error::{Error, Result};

/// Ports checked by a scan when nothing else is configured.
pub const DEFAULT_DEV_PORTS: &[u16] = &[
    3000, 3001, 4200, 5000, 5173, 5432, 6379, 8000, 8080, 8888, 9000, 27017,
];

/// Configuration data stored in JSON format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Curated list of ports checked by a scan.
    #[serde(default = "default_dev_ports", rename = "devPorts")]
    pub dev_ports: Vec<u16>,

    /// Ranges walked, in order, when suggesting free ports.
    #[serde(default = "default_suggest_ranges", rename = "suggestRanges")]
    pub suggest_ranges: Vec<PortRange>,

    /// How many free ports to suggest by default.
    #[serde(default = "default_suggest_count", rename = "suggestCount")]
    pub suggest_count: usize,
}

fn default_dev_ports() -> Vec<u16> {
    DEFAULT_DEV_PORTS.to_vec()
}

fn default_suggest_ranges() -> Vec<PortRange> {
    [(3000, 3999), (5000, 5999), (8000, 8999)]
        .into_iter()
        .filter_map(|(start, end)| PortRange::new(start, end).ok())
        .collect()
}

fn default_suggest_count() -> usize {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dev_ports: default_dev_ports(),
            suggest_ranges: default_suggest_ranges(),
            suggest_count: default_suggest_count(),
        }
    }
}

/// Configuration store for reading and writing settings.
///
/// Handles reading and writing configuration to `~/.portprobe/config.json`.
pub struct ConfigStore {
    /// Path to the configuration file.
    config_path: PathBuf,
}

impl ConfigStore {
    /// Create a new config store with the default path.
    ///
    /// Default path: `~/.portprobe/config.json`
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

        let config_path = home.join(".portprobe").join("config.json");
        Ok(Self { config_path })
    }

    /// Create a config store with a custom path (for testing).
    pub fn with_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    /// Get the configuration file path.
    pub fn path(&self) -> &std::path::Path {
        &self.config_path
    }

    /// Load configuration from disk.
    ///
    /// Returns default config if the file doesn't exist.
    pub fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&self.config_path)
            .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(config_dir) = self.config_path.parent() {
            fs::create_dir_all(config_dir)
                .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;
        }

        let content = serde_json::to_string_pretty(config)?;

        // Write atomically by writing to temp file then renaming
        let temp_path = self.config_path.with_extension("json.tmp");

        let mut file = fs::File::create(&temp_path)
            .map_err(|e| Error::Config(format!("Failed to create temp config file: {}", e)))?;

        file.write_all(content.as_bytes())
            .map_err(|e| Error::Config(format!("Failed to write config: {}", e)))?;

        file.sync_all()
            .map_err(|e| Error::Config(format!("Failed to sync config: {}", e)))?;

        fs::rename(&temp_path, &self.config_path)
            .map_err(|e| Error::Config(format!("Failed to rename config file: {}", e)))?;

        Ok(())
    }
}
