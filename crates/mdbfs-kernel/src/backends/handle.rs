//! Shared SQLite connection handle.
//!
//! `rusqlite::Connection` is `Send` but not `Sync`, so the handle serializes
//! access behind a mutex. That is the connection-level serialization the
//! database library would otherwise provide; the mapping engine adds no
//! ordering of its own.

use std::path::Path;

use parking_lot::Mutex;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};

use crate::error::{FsError, FsResult};

/// The single open database connection owned by a backend.
#[derive(Debug)]
pub(crate) struct DbHandle {
    backend: &'static str,
    conn: Option<Mutex<Connection>>,
}

impl DbHandle {
    pub(crate) fn new(backend: &'static str) -> Self {
        Self {
            backend,
            conn: None,
        }
    }

    /// Open `path`, dropping any previous session.
    pub(crate) fn open(&mut self, path: &Path, flags: OpenFlags) -> FsResult<&mut Connection> {
        if self.conn.is_some() {
            tracing::warn!(backend = self.backend, "a database is already open, dropping the previous session");
            self.close();
        }

        tracing::info!(backend = self.backend, path = %path.display(), "opening database");
        let conn = Connection::open_with_flags(path, flags).map_err(|e| {
            FsError::backend(format!("cannot open {}: {e}", path.display()))
        })?;
        Ok(self.conn.insert(Mutex::new(conn)).get_mut())
    }

    pub(crate) fn close(&mut self) {
        match self.conn.take() {
            Some(conn) => {
                tracing::info!(backend = self.backend, "closing database");
                if let Err((_, e)) = conn.into_inner().close() {
                    tracing::warn!(backend = self.backend, error = %e, "close reported an error, closing anyway");
                }
            }
            None => {
                tracing::debug!(backend = self.backend, "close called on a closed handle");
            }
        }
    }

    pub(crate) fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Run `f` against the open connection.
    pub(crate) fn with<T>(&self, f: impl FnOnce(&Connection) -> FsResult<T>) -> FsResult<T> {
        let conn = self
            .conn
            .as_ref()
            .ok_or_else(|| FsError::backend(format!("{}: database is not open", self.backend)))?;
        let guard = conn.lock();
        f(&guard)
    }

}

impl Drop for DbHandle {
    fn drop(&mut self) {
        self.close();
    }
}

/// Quote an SQL identifier.
///
/// Names reaching this point already passed segment validation, so they hold
/// no quote characters; embedded quotes are still doubled.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Select expression for `column` that hands REAL values back as SQLite's
/// own text rendering (`1.0`, `1.0e+20`).
pub(crate) fn text_of(column: &str) -> String {
    let column = quote_ident(column);
    format!("CASE WHEN typeof({column}) = 'real' THEN CAST({column} AS TEXT) ELSE {column} END")
}

/// Bytes shown for a stored value.
///
/// NULL is empty and integers are printed in decimal; text and blobs are
/// returned as stored. REAL is normally converted by [`text_of`] before it
/// gets here.
pub(crate) fn value_bytes(value: ValueRef<'_>) -> Vec<u8> {
    match value {
        ValueRef::Null => Vec::new(),
        ValueRef::Integer(i) => i.to_string().into_bytes(),
        ValueRef::Real(f) => format!("{f:?}").into_bytes(),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => bytes.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("users"), "\"users\"");
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_value_bytes() {
        assert!(value_bytes(ValueRef::Null).is_empty());
        assert_eq!(value_bytes(ValueRef::Integer(-42)), b"-42");
        assert_eq!(value_bytes(ValueRef::Real(0.25)), b"0.25");
        assert_eq!(value_bytes(ValueRef::Real(1.0)), b"1.0");
        assert_eq!(value_bytes(ValueRef::Text(b"abc")), b"abc");
        assert_eq!(value_bytes(ValueRef::Blob(&[0, 1])), vec![0, 1]);
    }

    #[test]
    fn test_text_of_renders_reals_like_sqlite() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE t (v);
             INSERT INTO t (rowid, v) VALUES (1, 1.0), (2, 2.5), (3, 7), (4, 'x');",
        )
        .unwrap();
        let sql = format!("SELECT {} FROM t WHERE rowid = ?1", text_of("v"));
        let read = |rowid: i64| {
            conn.query_row(&sql, [rowid], |row| row.get_ref(0).map(value_bytes))
                .unwrap()
        };
        assert_eq!(read(1), b"1.0");
        assert_eq!(read(2), b"2.5");
        assert_eq!(read(3), b"7");
        assert_eq!(read(4), b"x");
    }

    #[test]
    fn test_closed_handle_fails() {
        let handle = DbHandle::new("test");
        assert!(!handle.is_open());
        let err = handle.with(|_| Ok(())).unwrap_err();
        assert!(matches!(err, FsError::Backend(_)));
    }

    #[test]
    fn test_open_close() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("handle.db");
        let mut handle = DbHandle::new("test");
        handle.open(&path, OpenFlags::default()).unwrap();
        assert!(handle.is_open());
        handle
            .with(|conn| Ok(conn.execute_batch("CREATE TABLE t (c)")?))
            .unwrap();
        handle.close();
        assert!(!handle.is_open());
        // Closing twice is harmless.
        handle.close();
    }
}
