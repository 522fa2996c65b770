//! Flat key-value backend.
//!
//! Records live in a single SQLite table; each key is a file at the root and
//! its value is the file content.

use std::path::Path;

use rusqlite::{params, OpenFlags, OptionalExtension};

use super::handle::{text_of, value_bytes, DbHandle};
use crate::backend::Backend;
use crate::error::{FsError, FsResult};
use crate::location::{Location, LocationKind, Schema};

const NAME: &str = "kv";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS records (
    key TEXT PRIMARY KEY,
    value BLOB NOT NULL
);
"#;

const HELP: &str = "\
Maps a flat record store. Every key is a file at the root of the mount and
the file content is the stored value. Keys are listed in sorted order.
Renaming a file moves the value to the new key, replacing any record already
stored there. The store is created if the database file does not exist.";

/// Key-value record backend.
#[derive(Debug)]
pub struct KvBackend {
    db: DbHandle,
}

impl KvBackend {
    pub fn new() -> Self {
        Self {
            db: DbHandle::new(NAME),
        }
    }

    pub fn boxed() -> Box<dyn Backend> {
        Box::new(Self::new())
    }
}

impl Default for KvBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn record_key(location: &Location) -> FsResult<&str> {
    match location.kind() {
        LocationKind::Record => location
            .key()
            .ok_or_else(|| FsError::invalid_path(location.to_string())),
        LocationKind::Root => Err(FsError::is_a_directory("/")),
        _ => Err(FsError::invalid_path(location.to_string())),
    }
}

impl Backend for KvBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "backend for flat key-value record stores"
    }

    fn help(&self) -> Option<&'static str> {
        Some(HELP)
    }

    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    fn schema(&self) -> Schema {
        Schema::KeyValue
    }

    fn open(&mut self, path: &Path) -> FsResult<()> {
        let conn = self.db.open(path, OpenFlags::default())?;
        if let Err(e) = conn.execute_batch(SCHEMA) {
            self.db.close();
            return Err(FsError::backend(format!("{}: {e}", path.display())));
        }
        Ok(())
    }

    fn close(&mut self) {
        self.db.close();
    }

    fn is_open(&self) -> bool {
        self.db.is_open()
    }

    fn list_children(&self, location: &Location) -> FsResult<Vec<String>> {
        if !location.is_root() {
            return Err(FsError::not_a_directory(location.to_string()));
        }
        tracing::debug!("list_children /");
        self.db.with(|conn| {
            let mut stmt =
                conn.prepare("SELECT key FROM records WHERE key <> '' ORDER BY key")?;
            let keys = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(keys)
        })
    }

    fn read_leaf(&self, location: &Location) -> FsResult<Vec<u8>> {
        let key = record_key(location)?;
        tracing::debug!(key, "read_leaf");
        let sql = format!("SELECT {} FROM records WHERE key = ?1", text_of("value"));
        self.db.with(|conn| {
            conn.query_row(
                &sql,
                params![key],
                |row| row.get_ref(0).map(value_bytes),
            )
            .optional()?
            .ok_or_else(|| FsError::not_found(location.to_string()))
        })
    }

    fn write_leaf(&self, location: &Location, data: &[u8]) -> FsResult<()> {
        let key = record_key(location)?;
        tracing::debug!(key, len = data.len(), "write_leaf");
        self.db.with(|conn| {
            conn.execute(
                "INSERT INTO records (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, data],
            )?;
            Ok(())
        })
    }

    fn create(&self, location: &Location) -> FsResult<()> {
        if location.is_root() {
            return Err(FsError::already_exists("/"));
        }
        let key = record_key(location)?;
        tracing::debug!(key, "create");
        self.db.with(|conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO records (key, value) VALUES (?1, x'')",
                params![key],
            )?;
            if inserted == 0 {
                return Err(FsError::already_exists(location.to_string()));
            }
            Ok(())
        })
    }

    fn rename(&self, from: &Location, to: &Location) -> FsResult<()> {
        if from.kind() != to.kind() {
            return Err(FsError::CrossKind {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        if from.is_root() {
            return Err(FsError::unsupported("cannot rename the root"));
        }
        let old = record_key(from)?;
        let new = record_key(to)?;
        tracing::debug!(old, new, "rename");
        if old == new {
            return Ok(());
        }

        // A single statement: the destination row, if any, is replaced and
        // the stored value keeps its storage class.
        self.db.with(|conn| {
            let moved = conn.execute(
                "UPDATE OR REPLACE records SET key = ?1 WHERE key = ?2",
                params![new, old],
            )?;
            if moved == 0 {
                return Err(FsError::not_found(from.to_string()));
            }
            Ok(())
        })
    }

    fn remove(&self, location: &Location) -> FsResult<()> {
        if location.is_root() {
            return Err(FsError::unsupported("cannot remove the root"));
        }
        let key = record_key(location)?;
        tracing::debug!(key, "remove");
        self.db.with(|conn| {
            if conn.execute("DELETE FROM records WHERE key = ?1", params![key])? == 0 {
                return Err(FsError::not_found(location.to_string()));
            }
            Ok(())
        })
    }
}
