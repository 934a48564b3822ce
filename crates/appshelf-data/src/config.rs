//! # Data Layer Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     APPSHELF_CACHE_TTL_SECS=60                                         │
//! │     APPSHELF_CACHE_MAX_ENTRIES=128                                     │
//! │     APPSHELF_SNAPSHOT=./fixtures/catalog.json                          │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/appshelf/appshelf.toml (Linux)                           │
//! │     ~/Library/Application Support/com.appshelf.appshelf/... (macOS)    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     5 minute TTL, 512 cache entries, no snapshot                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [cache]
//! ttl_secs = 300
//! max_entries = 512
//!
//! [source]
//! snapshot_path = "/srv/appshelf/catalog.json"
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ConfigError, ConfigResult};

/// Default freshness window for cached payloads.
pub const DEFAULT_TTL_SECS: u64 = 5 * 60;

/// Default cache capacity before least-recently-used eviction kicks in.
pub const DEFAULT_MAX_ENTRIES: usize = 512;

// =============================================================================
// Cache Settings
// =============================================================================

/// TTL cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Seconds a payload stays fresh.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Entry bound. Inserting a new key into a full cache evicts the least
    /// recently accessed entry.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

fn default_ttl_secs() -> u64 {
    DEFAULT_TTL_SECS
}

fn default_max_entries() -> usize {
    DEFAULT_MAX_ENTRIES
}

impl Default for CacheSettings {
    fn default() -> Self {
        CacheSettings {
            ttl_secs: default_ttl_secs(),
            max_entries: default_max_entries(),
        }
    }
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

// =============================================================================
// Source Settings
// =============================================================================

/// Where the in-memory source loads its snapshot from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_path: Option<PathBuf>,
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete data layer configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub source: SourceSettings,
}

impl DataConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (appshelf.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading data config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load data config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Parses a TOML document. Missing sections fall back to defaults.
    pub fn from_toml(contents: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ConfigError::SaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::SaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| ConfigError::SaveFailed(e.to_string()))?;

        info!(?path, "Data config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.cache.ttl_secs == 0 {
            return Err(ConfigError::Invalid(
                "cache.ttl_secs must be greater than 0".into(),
            ));
        }

        if self.cache.max_entries == 0 {
            return Err(ConfigError::Invalid(
                "cache.max_entries must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(ttl) = std::env::var("APPSHELF_CACHE_TTL_SECS") {
            match ttl.parse::<u64>() {
                Ok(secs) => {
                    debug!(ttl_secs = secs, "Overriding cache TTL from environment");
                    self.cache.ttl_secs = secs;
                }
                Err(_) => warn!(value = %ttl, "Ignoring non-numeric APPSHELF_CACHE_TTL_SECS"),
            }
        }

        if let Ok(max) = std::env::var("APPSHELF_CACHE_MAX_ENTRIES") {
            match max.parse::<usize>() {
                Ok(n) => self.cache.max_entries = n,
                Err(_) => warn!(value = %max, "Ignoring non-numeric APPSHELF_CACHE_MAX_ENTRIES"),
            }
        }

        if let Ok(path) = std::env::var("APPSHELF_SNAPSHOT") {
            debug!(path = %path, "Overriding snapshot path from environment");
            self.source.snapshot_path = Some(PathBuf::from(path));
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "appshelf", "appshelf")
            .map(|dirs| dirs.config_dir().join("appshelf.toml"))
    }
}
