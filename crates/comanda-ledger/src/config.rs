//! # Configuration
//!
//! Settings loaded once at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`COMANDA_*`)
//! 2. Config file (`comanda.toml`)
//! 3. Defaults (this file)
//!
//! ## Example `comanda.toml`
//! ```toml
//! [database]
//! path = "/var/lib/comanda/comanda.db"
//! max_connections = 5
//!
//! [pix]
//! key = "cashier@example.com"
//! merchant_name = "Lanchonete da Praça"
//! merchant_city = "São Paulo"
//!
//! [revenue]
//! utc_offset = "-03:00"   # or "local" (default)
//! ```
//!
//! Configuration is read-only after loading, so no lock is needed.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use comanda_core::pix::payload::{DEFAULT_MERCHANT_CITY, DEFAULT_MERCHANT_NAME};
use comanda_core::validation::validate_pix_key;
use comanda_core::DayClock;
use comanda_db::DbConfig;

pub const ENV_DB_PATH: &str = "COMANDA_DB_PATH";
pub const ENV_PIX_KEY: &str = "COMANDA_PIX_KEY";
pub const ENV_MERCHANT_NAME: &str = "COMANDA_MERCHANT_NAME";
pub const ENV_MERCHANT_CITY: &str = "COMANDA_MERCHANT_CITY";
pub const ENV_UTC_OFFSET: &str = "COMANDA_UTC_OFFSET";

const CONFIG_FILE: &str = "comanda.toml";
const DATABASE_FILE: &str = "comanda.db";
const IN_MEMORY: &str = ":memory:";

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid setting {setting}: {reason}")]
    Invalid { setting: String, reason: String },

    #[error("Could not determine app data directory")]
    NoDataDir,
}

impl ConfigError {
    fn invalid(setting: &str, reason: impl ToString) -> Self {
        ConfigError::Invalid {
            setting: setting.to_string(),
            reason: reason.to_string(),
        }
    }
}

// =============================================================================
// Settings
// =============================================================================

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseSettings,
    pub pix: PixSettings,
    pub revenue: RevenueSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Database file. `None` uses the platform data directory;
    /// `":memory:"` opens a throwaway in-memory store.
    pub path: Option<PathBuf>,

    /// Default: 5
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: None,
            max_connections: 5,
        }
    }
}

/// Receiving account printed into every payment code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PixSettings {
    /// PIX key of the receiving account. Payment codes cannot be built
    /// without one, but the rest of the ledger works.
    pub key: Option<String>,

    pub merchant_name: String,

    pub merchant_city: String,

    /// Payment description is `"{prefix} {order id}"`.
    pub description_prefix: String,
}

impl Default for PixSettings {
    fn default() -> Self {
        PixSettings {
            key: None,
            merchant_name: DEFAULT_MERCHANT_NAME.to_string(),
            merchant_city: DEFAULT_MERCHANT_CITY.to_string(),
            description_prefix: "COMANDA".to_string(),
        }
    }
}

impl PixSettings {
    /// Settings for a key, keeping the default merchant.
    pub fn with_key(key: impl Into<String>) -> Self {
        PixSettings {
            key: Some(key.into()),
            ..PixSettings::default()
        }
    }

    pub fn description_for(&self, order_id: i64) -> String {
        format!("{} {}", self.description_prefix, order_id)
    }
}

/// How closings are grouped into days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevenueSettings {
    /// `"local"` for the machine's time zone, or a fixed offset like
    /// `"-03:00"` when the host clock runs in another zone.
    pub utc_offset: String,
}

impl Default for RevenueSettings {
    fn default() -> Self {
        RevenueSettings {
            utc_offset: "local".to_string(),
        }
    }
}

// =============================================================================
// Loading
// =============================================================================

impl AppConfig {
    /// Loads configuration: defaults, then the TOML file, then environment.
    ///
    /// With `path = None` the platform config directory is tried; a missing
    /// file there is not an error. An explicit path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => {
                    debug!("No config file found, using defaults");
                    AppConfig::default()
                }
            },
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        info!(path = %path.display(), "Configuration file loaded");
        Ok(config)
    }

    /// Applies `COMANDA_*` environment variables.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Applies overrides from any variable source.
    ///
    /// Empty values are ignored so an exported-but-blank variable doesn't
    /// wipe a configured key.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(path) = lookup(ENV_DB_PATH) {
            self.database.path = Some(PathBuf::from(path));
        }
        if let Some(key) = lookup(ENV_PIX_KEY) {
            self.pix.key = Some(key);
        }
        if let Some(name) = lookup(ENV_MERCHANT_NAME) {
            self.pix.merchant_name = name;
        }
        if let Some(city) = lookup(ENV_MERCHANT_CITY) {
            self.pix.merchant_city = city;
        }
        if let Some(offset) = lookup(ENV_UTC_OFFSET) {
            self.revenue.utc_offset = offset;
        }
    }

    /// Rejects settings the ledger cannot run with.
    ///
    /// Merchant name and city are not checked here; the payload builder
    /// already fits them into their fields.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::invalid(
                "database.max_connections",
                "must be at least 1",
            ));
        }

        if let Some(key) = &self.pix.key {
            validate_pix_key(key).map_err(|e| ConfigError::invalid("pix.key", e))?;
        }

        self.day_clock()?;
        Ok(())
    }

    /// The clock revenue days are counted on.
    pub fn day_clock(&self) -> Result<DayClock, ConfigError> {
        DayClock::parse(&self.revenue.utc_offset).ok_or_else(|| {
            ConfigError::invalid(
                "revenue.utc_offset",
                format!("expected \"local\" or +HH:MM, got {:?}", self.revenue.utc_offset),
            )
        })
    }

    /// Pool configuration for these settings.
    ///
    /// Creates the platform data directory when no path is configured.
    pub fn db_config(&self) -> Result<DbConfig, ConfigError> {
        let path = match &self.database.path {
            Some(path) if path.as_os_str() == IN_MEMORY => return Ok(DbConfig::in_memory()),
            Some(path) => path.clone(),
            None => {
                let dirs = project_dirs().ok_or(ConfigError::NoDataDir)?;
                let data_dir = dirs.data_dir();
                std::fs::create_dir_all(data_dir).map_err(|source| ConfigError::Read {
                    path: data_dir.to_path_buf(),
                    source,
                })?;
                data_dir.join(DATABASE_FILE)
            }
        };

        Ok(DbConfig::new(path).max_connections(self.database.max_connections))
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("br", "comanda", "comanda")
}

/// `comanda.toml` in the platform config directory.
///
/// - **Linux**: `~/.config/comanda/comanda.toml`
/// - **macOS**: `~/Library/Application Support/br.comanda.comanda/comanda.toml`
/// - **Windows**: `%APPDATA%\comanda\comanda\config\comanda.toml`
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

// =============================================================================
// Unit Tests
// =============================================================================
