//! Crosstrust configuration file handling
//!
//! Configuration is TOML and lives in the data directory next to the identity
//! database and the backup file:
//! - Config: ~/.local/share/crosstrust/config.toml
//! - Database: ~/.local/share/crosstrust/identity.db
//! - Backup: ~/.local/share/crosstrust/identity-backup.json

use crosstrust::store::DEFAULT_SECRET_PREFIX;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default log level
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default namespace of backup medium keys
pub const DEFAULT_NAMESPACE: &str = "crosstrust";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Failed to write config file '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossTrustConfig {
    pub identity: IdentityConfig,

    pub store: StoreConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// The local identity trust is evaluated from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityConfig {
    pub user_id: String,
    pub device_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database holding the primary identity store
    pub database_path: PathBuf,

    /// JSON file mirroring secret entries
    pub backup_path: PathBuf,

    /// Namespace of backup keys (`<namespace>.session.<key>`)
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Keys with this prefix are mirrored to the backup
    #[serde(default = "default_secret_prefix")]
    pub secret_prefix: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    pub file: Option<PathBuf>,
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_secret_prefix() -> String {
    DEFAULT_SECRET_PREFIX.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl CrossTrustConfig {
    /// Configuration for an identity stored under `data_dir`
    pub fn new(user_id: &str, device_id: &str, data_dir: &Path) -> Self {
        Self {
            identity: IdentityConfig {
                user_id: user_id.to_string(),
                device_id: device_id.to_string(),
            },
            store: StoreConfig {
                database_path: data_dir.join("identity.db"),
                backup_path: data_dir.join("identity-backup.json"),
                namespace: default_namespace(),
                secret_prefix: default_secret_prefix(),
            },
            logging: LoggingConfig::default(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    #[cfg(test)]
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        write_file(path, &contents)
    }

    /// Default configuration content with comments
    pub fn generate_default_toml(data_dir: &Path) -> String {
        format!(
            r#"# Crosstrust Configuration
#
# Identity trust is evaluated from the account and device below. Private
# cross-signing seeds are cached in the identity database and mirrored to
# the backup file so they survive loss of the database.

[identity]
# Matrix-style user id of the local account
user_id = "@me:example.org"

# Id of this device
device_id = "CROSSTRUST"

[store]
# Primary identity store (SQLite)
database_path = {database}

# Backup medium (JSON file, rewritten atomically)
backup_path = {backup}

# Backup keys are written as "<namespace>.session.<key>"
namespace = "{namespace}"

# Only keys with this prefix are mirrored
secret_prefix = "{prefix}"

[logging]
# Log level: trace, debug, info, warn, error
# RUST_LOG overrides this when set
level = "{level}"

# Log file path (optional, logs to stderr if not specified)
# file = "/var/log/crosstrust/crosstrust.log"
"#,
            database = toml_path(&data_dir.join("identity.db")),
            backup = toml_path(&data_dir.join("identity-backup.json")),
            namespace = DEFAULT_NAMESPACE,
            prefix = DEFAULT_SECRET_PREFIX,
            level = DEFAULT_LOG_LEVEL,
        )
    }

    /// Write the default configuration file
    pub fn create_default(config_path: &Path, data_dir: &Path) -> Result<(), ConfigError> {
        write_file(config_path, &Self::generate_default_toml(data_dir))
    }

    /// Load `config_path`, writing the default file first if it is missing.
    pub fn load_or_create(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            let data_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
            Self::create_default(config_path, data_dir)?;
            tracing::info!(path = %config_path.display(), "wrote default configuration");
        }
        Self::load(config_path)
    }
}

/// `path` as a quoted, escaped TOML string.
fn toml_path(path: &Path) -> String {
    toml::Value::String(path.display().to_string()).to_string()
}

fn write_file(path: &Path, contents: &str) -> Result<(), ConfigError> {
    let write_error = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_error)?;
    }
    fs::write(path, contents).map_err(write_error)
}

/// Default data directory
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("crosstrust")
}

/// Config file path: `--config` if given, else the data directory default
pub fn resolve_config_path(config: Option<&str>) -> PathBuf {
    config
        .map(PathBuf::from)
        .unwrap_or_else(|| default_data_dir().join("config.toml"))
}

/// Logging settings at `config_path`, or the defaults when the file is
/// missing or unreadable.
pub fn configured_logging(config_path: &Path) -> LoggingConfig {
    CrossTrustConfig::load(config_path)
        .map(|config| config.logging)
        .unwrap_or_default()
}
