//! Start-up: backend selection and database opening.

use std::path::{Path, PathBuf};

use mdbfs_kernel::{BackendRegistry, FsError, MappedFs};

use crate::config::{ConfigError, MdbfsConfig};

/// Exit status for configuration errors.
pub const EXIT_CONFIG: u8 = 1;

/// Exit status for usage errors: no database path or no command.
pub const EXIT_USAGE: u8 = 2;

/// Errors that stop the driver before any filesystem call is made.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("no backend selected, pass --type NAME (known backends: {known})")]
    NoBackend { known: String },

    #[error("unknown backend {name:?} (known backends: {known})")]
    UnknownBackend { name: String, known: String },

    #[error("no database given, pass --db PATH")]
    NoDatabase,

    #[error("no command given, see mdbfs --help")]
    NoCommand,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("cannot open {path} with backend {backend}: {source}")]
    Open {
        backend: String,
        path: PathBuf,
        #[source]
        source: FsError,
    },
}

impl StartupError {
    pub fn exit_code(&self) -> u8 {
        match self {
            StartupError::NoBackend { .. }
            | StartupError::UnknownBackend { .. }
            | StartupError::Config(_) => EXIT_CONFIG,
            StartupError::NoDatabase | StartupError::NoCommand => EXIT_USAGE,
            StartupError::Open { source, .. } => errno_status(source),
        }
    }
}

/// Backend name and database path after merging flags over the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub backend: String,
    pub database: PathBuf,
}

impl Selection {
    /// Merge command-line values over configuration values.
    ///
    /// The database path is checked before the backend name.
    pub fn resolve(
        registry: &BackendRegistry,
        backend: Option<&str>,
        database: Option<&Path>,
        config: &MdbfsConfig,
    ) -> Result<Self, StartupError> {
        let known = || registry.names().join(", ");
        let database = database
            .or(config.database.as_deref())
            .ok_or(StartupError::NoDatabase)?;
        let backend = backend
            .or(config.backend.as_deref())
            .ok_or_else(|| StartupError::NoBackend { known: known() })?;
        if !registry.contains(backend) {
            return Err(StartupError::UnknownBackend {
                name: backend.to_string(),
                known: known(),
            });
        }
        Ok(Self {
            backend: backend.to_string(),
            database: database.to_path_buf(),
        })
    }

    /// Instantiate the backend and open the database.
    pub fn open(&self, registry: &BackendRegistry) -> Result<MappedFs, StartupError> {
        let backend = registry
            .resolve(&self.backend)
            .ok_or_else(|| StartupError::UnknownBackend {
                name: self.backend.clone(),
                known: registry.names().join(", "),
            })?;
        tracing::info!(backend = %self.backend, database = %self.database.display(), "opening");
        MappedFs::open(backend, &self.database).map_err(|source| StartupError::Open {
            backend: self.backend.clone(),
            path: self.database.clone(),
            source,
        })
    }
}

/// Process exit status for a filesystem error: its errno, clamped to a byte.
pub fn errno_status(err: &FsError) -> u8 {
    u8::try_from(err.errno()).unwrap_or(u8::MAX)
}

/// Process exit status for any driver error.
pub fn exit_status(err: &anyhow::Error) -> u8 {
    if let Some(startup) = err.downcast_ref::<StartupError>() {
        return startup.exit_code();
    }
    if let Some(fs) = err.downcast_ref::<FsError>() {
        return errno_status(fs);
    }
    EXIT_CONFIG
}
