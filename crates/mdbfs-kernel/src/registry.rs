//! Backend registry.
//!
//! Maps backend names, aliases included, to factories. The registry is built
//! once at start-up and only read afterwards.

use std::fmt::{self, Write as _};

use crate::backend::Backend;
use crate::backends::{KvBackend, SqliteBackend};
use crate::error::{FsError, FsResult};

/// Produces a fresh, unopened backend.
pub type BackendFactory = fn() -> Box<dyn Backend>;

const NO_HELP: &str = "There is no help for this backend.";

/// One registered name.
#[derive(Clone)]
struct Entry {
    name: String,
    factory: BackendFactory,
}

/// Name-to-factory table for the compiled-in backends.
#[derive(Clone, Default)]
pub struct BackendRegistry {
    entries: Vec<Entry>,
}

impl fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("names", &self.names())
            .finish()
    }
}

impl BackendRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every backend compiled into this crate.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        let builtins: [(&[&str], BackendFactory); 2] = [
            (&["sqlite", "sqlite3"], SqliteBackend::boxed),
            (&["kv", "keyvalue"], KvBackend::boxed),
        ];
        for (names, factory) in builtins {
            // Built-in names are distinct, so registration cannot collide.
            if let Err(e) = registry.register_aliases(names, factory) {
                tracing::error!(error = %e, "built-in backend registration failed");
            }
        }
        registry
    }

    /// Register `factory` under `name`.
    ///
    /// A name already present is a configuration error.
    pub fn register(&mut self, name: impl Into<String>, factory: BackendFactory) -> FsResult<()> {
        let name = name.into();
        if name.is_empty() {
            return Err(FsError::config("backend name must not be empty"));
        }
        if self.contains(&name) {
            return Err(FsError::config(format!(
                "backend {name:?} is registered twice"
            )));
        }
        tracing::debug!(backend = %name, "registered backend");
        self.entries.push(Entry { name, factory });
        Ok(())
    }

    /// Register the same factory under several names.
    ///
    /// Either every name is registered or none is.
    pub fn register_aliases(&mut self, names: &[&str], factory: BackendFactory) -> FsResult<()> {
        for (i, name) in names.iter().enumerate() {
            if self.contains(name) || names[..i].contains(name) {
                return Err(FsError::config(format!(
                    "backend {name:?} is registered twice"
                )));
            }
        }
        for name in names {
            self.register(*name, factory)?;
        }
        Ok(())
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| entry.name == name)
    }

    /// Instantiate the backend registered as `name`.
    ///
    /// Exact, case-sensitive match. Returns `None` for unknown names.
    pub fn resolve(&self, name: &str) -> Option<Box<dyn Backend>> {
        let entry = self.entries.iter().find(|entry| entry.name == name)?;
        Some((entry.factory)())
    }

    /// Every registered name, aliases included, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.name.as_str()).collect()
    }

    /// Entries registered under the backend's own name, one per backend.
    fn primaries(&self) -> impl Iterator<Item = Box<dyn Backend>> + '_ {
        self.entries.iter().filter_map(|entry| {
            let backend = (entry.factory)();
            (backend.name() == entry.name).then_some(backend)
        })
    }

    /// Usage text for every backend.
    pub fn help_text(&self) -> String {
        let mut out = String::new();
        for backend in self.primaries() {
            let _ = write!(
                out,
                "{} - {}\n\n{}\n\n",
                backend.name(),
                backend.description(),
                backend.help().unwrap_or(NO_HELP)
            );
        }
        out
    }

    /// Version line for every backend.
    pub fn version_text(&self) -> String {
        let mut out = String::new();
        for backend in self.primaries() {
            let _ = writeln!(out, "Backend {} version {}", backend.name(), backend.version());
        }
        out
    }
}
