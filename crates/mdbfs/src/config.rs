//! Driver configuration.
//!
//! An optional RON file supplies defaults for the backend, the database path,
//! the log filter and mount options. Command-line flags win over the file.
//!
//! ```ron
//! (
//!     backend: Some("sqlite"),
//!     database: Some("/var/db/app.sqlite"),
//!     log_filter: Some("mdbfs=debug"),
//!     mount: (fsname: "mdbfs", auto_unmount: true, allow_other: false),
//! )
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse {path}: {source}")]
    Ron {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
}

/// Contents of `config.ron`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MdbfsConfig {
    /// Backend name or alias.
    pub backend: Option<String>,
    /// Database file handed to the backend.
    pub database: Option<PathBuf>,
    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_filter: Option<String>,
    /// FUSE mount options.
    pub mount: MountConfig,
}

/// Options passed to the FUSE runtime.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MountConfig {
    pub fsname: String,
    pub auto_unmount: bool,
    pub allow_other: bool,
}

impl Default for MountConfig {
    fn default() -> Self {
        Self {
            fsname: "mdbfs".to_string(),
            auto_unmount: true,
            allow_other: false,
        }
    }
}

impl MdbfsConfig {
    /// `$XDG_CONFIG_HOME/mdbfs/config.ron`, or the platform equivalent.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("mdbfs").join("config.ron"))
    }

    /// Parse configuration text.
    pub fn from_ron(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        ron::from_str(text).map_err(|source| ConfigError::Ron {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Read a configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron(&text, path)
    }

    /// Load the configuration.
    ///
    /// An explicit path must exist. Without one, the default location is
    /// tried and a missing file yields the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }
}
