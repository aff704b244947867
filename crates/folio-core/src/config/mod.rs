//! Configuration management with file persistence

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Default number of versions kept per post by the retention policy
pub const DEFAULT_KEEP_COUNT: usize = 10;

/// Default number of attempts when version number allocation collides
pub const DEFAULT_MAX_ALLOCATION_ATTEMPTS: u32 = 8;

/// Default base delay between allocation attempts
pub const DEFAULT_RETRY_INTERVAL_MS: u64 = 10;

/// Folio configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseSettings,
    pub versioning: VersioningConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Database file; falls back to the platform data directory when unset
    pub path: Option<PathBuf>,
}

/// Tuning for version allocation and retention
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VersioningConfig {
    pub keep_count: usize,
    pub max_allocation_attempts: u32,
    pub retry_interval_ms: u64,
    /// Run the retention policy after every write that adds a version
    pub auto_prune: bool,
}

impl Default for VersioningConfig {
    fn default() -> Self {
        Self {
            keep_count: DEFAULT_KEEP_COUNT,
            max_allocation_attempts: DEFAULT_MAX_ALLOCATION_ATTEMPTS,
            retry_interval_ms: DEFAULT_RETRY_INTERVAL_MS,
            auto_prune: false,
        }
    }
}

impl VersioningConfig {
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    pub fn with_keep_count(mut self, keep_count: usize) -> Self {
        self.keep_count = keep_count;
        self
    }

    pub fn with_max_allocation_attempts(mut self, attempts: u32) -> Self {
        self.max_allocation_attempts = attempts;
        self
    }

    pub fn with_auto_prune(mut self, auto_prune: bool) -> Self {
        self.auto_prune = auto_prune;
        self
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.keep_count == 0 {
            return Err(anyhow!("versioning.keep_count must be at least 1"));
        }
        if self.max_allocation_attempts == 0 {
            return Err(anyhow!("versioning.max_allocation_attempts must be at least 1"));
        }
        Ok(())
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var("FOLIO_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("folio")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, or return defaults if it doesn't exist
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        self.validate()?;

        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;

        let path = Self::config_path()?;
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        self.versioning.validate()
    }

    /// Resolve the database path: `FOLIO_DATABASE`, then the config file, then the default
    pub fn database_path(&self) -> PathBuf {
        if let Ok(path) = env::var("FOLIO_DATABASE") {
            return PathBuf::from(path);
        }
        self.database
            .path
            .clone()
            .unwrap_or_else(crate::storage::default_database_path)
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            "database.path" => Ok(self.database_path().display().to_string()),
            "versioning.keep_count" => Ok(self.versioning.keep_count.to_string()),
            "versioning.max_allocation_attempts" => {
                Ok(self.versioning.max_allocation_attempts.to_string())
            }
            "versioning.retry_interval_ms" => Ok(self.versioning.retry_interval_ms.to_string()),
            "versioning.auto_prune" => Ok(self.versioning.auto_prune.to_string()),
            _ => Err(anyhow!(
                "Unknown configuration key: {}. Use `folio config list` to see available keys.",
                key
            )),
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "database.path" => {
                let value = value.trim();
                self.database.path = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
            "versioning.keep_count" => {
                let keep_count: usize = value
                    .parse()
                    .with_context(|| format!("Invalid keep_count value: {}", value))?;
                if keep_count == 0 {
                    return Err(anyhow!("keep_count must be at least 1"));
                }
                self.versioning.keep_count = keep_count;
            }
            "versioning.max_allocation_attempts" => {
                let attempts: u32 = value
                    .parse()
                    .with_context(|| format!("Invalid max_allocation_attempts value: {}", value))?;
                if attempts == 0 {
                    return Err(anyhow!("max_allocation_attempts must be at least 1"));
                }
                self.versioning.max_allocation_attempts = attempts;
            }
            "versioning.retry_interval_ms" => {
                self.versioning.retry_interval_ms = value
                    .parse()
                    .with_context(|| format!("Invalid retry_interval_ms value: {}", value))?;
            }
            "versioning.auto_prune" => {
                self.versioning.auto_prune = value
                    .parse()
                    .with_context(|| format!("Invalid auto_prune value: {} (expected true or false)", value))?;
            }
            _ => {
                return Err(anyhow!(
                    "Unknown configuration key: {}. Use `folio config list` to see available keys.",
                    key
                ));
            }
        }
        Ok(())
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        let keys = vec![
            "database.path",
            "versioning.keep_count",
            "versioning.max_allocation_attempts",
            "versioning.retry_interval_ms",
            "versioning.auto_prune",
        ];

        keys.into_iter()
            .map(|key| {
                let value = self.get(key)?;
                Ok((key.to_string(), value))
            })
            .collect()
    }

    /// Reset configuration to defaults
    pub fn reset() -> anyhow::Result<()> {
        let path = Self::config_path()?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove config file: {}", path.display()))?;
        }
        Ok(())
    }
}
