//! Catalog runtime configuration.
//!
//! # Responsibility
//! - Describe where the catalog database and image mount live.
//! - Load settings from an optional JSON file plus environment overrides.
//!
//! # Invariants
//! - A missing config file yields defaults, a malformed one is an error.
//! - Environment overrides always win over file values.

use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const ENV_DATABASE_PATH: &str = "DATASET_CATALOG_DB";
pub const ENV_IMAGE_ROOT: &str = "DATASET_CATALOG_IMAGE_ROOT";
pub const ENV_LOG_LEVEL: &str = "DATASET_CATALOG_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "DATASET_CATALOG_LOG_DIR";

const DEFAULT_DATABASE_PATH: &str = "dataset_catalog.sqlite3";
const DEFAULT_IMAGE_ROOT: &str = "/media/data_cifs";

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "invalid config `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
        }
    }
}

/// Settings needed to bind the catalog to storage and the image mount.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    /// SQLite database file.
    pub database_path: PathBuf,
    /// Mount root that image and label relative paths resolve against.
    pub image_root: PathBuf,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Absolute log directory. File logging stays off when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            image_root: PathBuf::from(DEFAULT_IMAGE_ROOT),
            log_level: crate::logging::default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl CatalogConfig {
    /// Loads `path` when it exists, then applies process environment
    /// overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parses a JSON config file. A missing file yields defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies overrides from a key lookup; blank values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(value) = non_blank(ENV_DATABASE_PATH) {
            self.database_path = PathBuf::from(value);
        }
        if let Some(value) = non_blank(ENV_IMAGE_ROOT) {
            self.image_root = PathBuf::from(value);
        }
        if let Some(value) = non_blank(ENV_LOG_LEVEL) {
            self.log_level = value;
        }
        if let Some(value) = non_blank(ENV_LOG_DIR) {
            self.log_dir = Some(PathBuf::from(value));
        }
    }
}
