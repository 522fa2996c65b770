//! Relational backend over SQLite 3.
//!
//! Tables are directories at the root, rows are directories named by their
//! `ROWID`, and every column of a row is a file holding the cell value.

use std::path::Path;

use rusqlite::types::Value;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};

use super::handle::{quote_ident, text_of, value_bytes, DbHandle};
use crate::backend::Backend;
use crate::error::{FsError, FsResult};
use crate::location::{Location, LocationKind, Schema};

const NAME: &str = "sqlite";

const HELP: &str = "\
Maps an existing SQLite 3 database file.

  /                   one directory per table (internal sqlite_* tables hidden)
  /<table>            one directory per row, named by its ROWID
  /<table>/<rowid>    one file per column

Cells read as text: NULL is empty, numbers are printed in decimal, BLOBs are
returned raw. Writes store valid UTF-8 as TEXT and anything else as a BLOB.
mkdir of a row inserts it, mknod of a cell adds the column to the table.
Tables cannot be created because SQLite has no zero-column tables.";

/// SQLite relational backend.
#[derive(Debug)]
pub struct SqliteBackend {
    db: DbHandle,
}

impl SqliteBackend {
    pub fn new() -> Self {
        Self {
            db: DbHandle::new(NAME),
        }
    }

    /// Registry factory.
    pub fn boxed() -> Box<dyn Backend> {
        Box::new(Self::new())
    }
}

impl Default for SqliteBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a row segment as a `ROWID`.
///
/// Only the canonical decimal spelling is accepted, so `01` and `+1` do not
/// alias row 1.
fn parse_rowid(segment: &str) -> Option<i64> {
    segment
        .parse::<i64>()
        .ok()
        .filter(|id| id.to_string() == segment)
}

/// Value stored for written bytes.
fn bytes_value(data: &[u8]) -> Value {
    match std::str::from_utf8(data) {
        Ok(text) => Value::Text(text.to_owned()),
        Err(_) => Value::Blob(data.to_vec()),
    }
}

/// Tables that map to directories: ordinary tables of the main schema that
/// have a `ROWID`. `WITHOUT ROWID` and virtual tables have no row names.
const MAPPED_TABLES: &str = "\
    SELECT name FROM pragma_table_list \
    WHERE schema = 'main' AND type = 'table' AND wr = 0 \
    AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\'";

fn table_exists(conn: &Connection, table: &str) -> FsResult<bool> {
    let sql = format!("{MAPPED_TABLES} AND name = ?1");
    let found = conn.query_row(&sql, params![table], |_| Ok(())).optional()?;
    Ok(found.is_some())
}

fn require_table(conn: &Connection, location: &Location, table: &str) -> FsResult<()> {
    if table_exists(conn, table)? {
        Ok(())
    } else {
        Err(FsError::not_found(location.to_string()))
    }
}

/// Column names in declaration order. Empty for a missing table.
fn column_names(conn: &Connection, table: &str) -> FsResult<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1) ORDER BY cid")?;
    let names = stmt
        .query_map(params![table], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}

fn column_exists(conn: &Connection, table: &str, column: &str) -> FsResult<bool> {
    Ok(column_names(conn, table)?.iter().any(|name| name == column))
}

fn row_exists(conn: &Connection, table: &str, rowid: i64) -> FsResult<bool> {
    let sql = format!("SELECT 1 FROM {} WHERE rowid = ?1", quote_ident(table));
    let found = conn.query_row(&sql, params![rowid], |_| Ok(())).optional()?;
    Ok(found.is_some())
}

/// Resolve the row segment of `location` to an existing `ROWID`.
fn require_row(conn: &Connection, location: &Location, table: &str, row: &str) -> FsResult<i64> {
    match parse_rowid(row) {
        Some(rowid) if row_exists(conn, table, rowid)? => Ok(rowid),
        _ => Err(FsError::not_found(location.to_string())),
    }
}

/// Table, row and column of a cell location.
fn cell_parts(location: &Location) -> FsResult<(&str, &str, &str)> {
    match (location.table(), location.row(), location.column()) {
        (Some(table), Some(row), Some(column)) => Ok((table, row, column)),
        _ => Err(FsError::invalid_path(location.to_string())),
    }
}

fn table_part(location: &Location) -> FsResult<&str> {
    location
        .table()
        .ok_or_else(|| FsError::invalid_path(location.to_string()))
}

fn row_parts(location: &Location) -> FsResult<(&str, &str)> {
    match (location.table(), location.row()) {
        (Some(table), Some(row)) => Ok((table, row)),
        _ => Err(FsError::invalid_path(location.to_string())),
    }
}

impl Backend for SqliteBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "backend for SQLite 3 databases"
    }

    fn help(&self) -> Option<&'static str> {
        Some(HELP)
    }

    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    fn schema(&self) -> Schema {
        Schema::Relational
    }

    fn open(&mut self, path: &Path) -> FsResult<()> {
        // The database must already exist; mapping never creates one.
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = self.db.open(path, flags)?;
        tracing::debug!(sqlite = rusqlite::version(), "sqlite library loaded");
        // A file that is not a database only fails on its first query.
        let check = conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| {
            row.get::<_, i64>(0)
        });
        match check {
            Ok(tables) => {
                tracing::debug!(tables, "schema entries");
                Ok(())
            }
            Err(e) => {
                self.db.close();
                Err(FsError::backend(format!("{}: {e}", path.display())))
            }
        }
    }

    fn close(&mut self) {
        self.db.close();
    }

    fn is_open(&self) -> bool {
        self.db.is_open()
    }

    fn list_children(&self, location: &Location) -> FsResult<Vec<String>> {
        tracing::debug!(%location, "list_children");
        self.db.with(|conn| match location.kind() {
            LocationKind::Root => {
                let mut stmt = conn.prepare(&format!("{MAPPED_TABLES} ORDER BY name"))?;
                let tables = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(tables)
            }
            LocationKind::Table => {
                let table = table_part(location)?;
                require_table(conn, location, table)?;
                let sql = format!("SELECT rowid FROM {} ORDER BY rowid", quote_ident(table));
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map([], |row| row.get::<_, i64>(0))?
                    .map(|id| id.map(|id| id.to_string()))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            }
            LocationKind::Row => {
                let (table, row) = row_parts(location)?;
                require_table(conn, location, table)?;
                require_row(conn, location, table, row)?;
                column_names(conn, table)
            }
            _ => Err(FsError::not_a_directory(location.to_string())),
        })
    }

    fn read_leaf(&self, location: &Location) -> FsResult<Vec<u8>> {
        if location.kind() != LocationKind::Cell {
            return Err(FsError::is_a_directory(location.to_string()));
        }
        tracing::debug!(%location, "read_leaf");
        let (table, row, column) = cell_parts(location)?;
        let rowid = parse_rowid(row).ok_or_else(|| FsError::not_found(location.to_string()))?;

        self.db.with(|conn| {
            if !column_exists(conn, table, column)? {
                return Err(FsError::not_found(location.to_string()));
            }
            let sql = format!(
                "SELECT {} FROM {} WHERE rowid = ?1",
                text_of(column),
                quote_ident(table)
            );
            conn.query_row(&sql, params![rowid], |row| row.get_ref(0).map(value_bytes))
                .optional()?
                .ok_or_else(|| FsError::not_found(location.to_string()))
        })
    }

    fn write_leaf(&self, location: &Location, data: &[u8]) -> FsResult<()> {
        if location.kind() != LocationKind::Cell {
            return Err(FsError::is_a_directory(location.to_string()));
        }
        tracing::debug!(%location, len = data.len(), "write_leaf");
        let (table, row, column) = cell_parts(location)?;
        let rowid = parse_rowid(row).ok_or_else(|| FsError::not_found(location.to_string()))?;

        self.db.with(|conn| {
            if !column_exists(conn, table, column)? {
                return Err(FsError::not_found(location.to_string()));
            }
            let sql = format!(
                "UPDATE {} SET {} = ?1 WHERE rowid = ?2",
                quote_ident(table),
                quote_ident(column)
            );
            let changed = conn.execute(&sql, params![bytes_value(data), rowid])?;
            if changed == 0 {
                return Err(FsError::not_found(location.to_string()));
            }
            Ok(())
        })
    }

    fn create(&self, location: &Location) -> FsResult<()> {
        tracing::debug!(%location, "create");
        match location.kind() {
            LocationKind::Root => Err(FsError::already_exists("/")),
            LocationKind::Table => Err(FsError::unsupported(format!(
                "{location}: cannot create a table without columns"
            ))),
            LocationKind::Row => {
                let (table, row) = row_parts(location)?;
                let rowid = parse_rowid(row).ok_or_else(|| {
                    FsError::invalid_path(format!("{location}: row names are integer ROWIDs"))
                })?;
                self.db.with(|conn| {
                    require_table(conn, location, table)?;
                    if row_exists(conn, table, rowid)? {
                        return Err(FsError::already_exists(location.to_string()));
                    }
                    let sql = format!("INSERT INTO {} (rowid) VALUES (?1)", quote_ident(table));
                    conn.execute(&sql, params![rowid])?;
                    Ok(())
                })
            }
            LocationKind::Cell => {
                let (table, row, column) = cell_parts(location)?;
                self.db.with(|conn| {
                    require_table(conn, location, table)?;
                    require_row(conn, location, table, row)?;
                    if column_exists(conn, table, column)? {
                        return Err(FsError::already_exists(location.to_string()));
                    }
                    let sql = format!(
                        "ALTER TABLE {} ADD COLUMN {}",
                        quote_ident(table),
                        quote_ident(column)
                    );
                    conn.execute_batch(&sql)?;
                    tracing::info!(table, column, "added column");
                    Ok(())
                })
            }
            LocationKind::Record => Err(FsError::invalid_path(location.to_string())),
        }
    }

    fn rename(&self, from: &Location, to: &Location) -> FsResult<()> {
        if from.kind() != to.kind() {
            return Err(FsError::CrossKind {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        tracing::debug!(%from, %to, "rename");
        if from == to {
            return Ok(());
        }

        match from.kind() {
            LocationKind::Root => Err(FsError::unsupported("cannot rename the root")),
            LocationKind::Table => {
                let old = table_part(from)?;
                let new = table_part(to)?;
                self.db.with(|conn| {
                    require_table(conn, from, old)?;
                    if table_exists(conn, new)? {
                        return Err(FsError::already_exists(to.to_string()));
                    }
                    let sql = format!(
                        "ALTER TABLE {} RENAME TO {}",
                        quote_ident(old),
                        quote_ident(new)
                    );
                    conn.execute_batch(&sql)?;
                    Ok(())
                })
            }
            LocationKind::Row => {
                let (table, old) = row_parts(from)?;
                let (to_table, new) = row_parts(to)?;
                if table != to_table {
                    return Err(FsError::unsupported(format!(
                        "{from} -> {to}: rows cannot move between tables"
                    )));
                }
                let old = parse_rowid(old).ok_or_else(|| FsError::not_found(from.to_string()))?;
                let new = parse_rowid(new).ok_or_else(|| {
                    FsError::invalid_path(format!("{to}: row names are integer ROWIDs"))
                })?;
                self.db.with(|conn| {
                    require_table(conn, from, table)?;
                    if !row_exists(conn, table, old)? {
                        return Err(FsError::not_found(from.to_string()));
                    }
                    if row_exists(conn, table, new)? {
                        return Err(FsError::already_exists(to.to_string()));
                    }
                    let sql = format!("UPDATE {} SET rowid = ?1 WHERE rowid = ?2", quote_ident(table));
                    conn.execute(&sql, params![new, old])?;
                    Ok(())
                })
            }
            LocationKind::Cell => {
                let (table, row, old) = cell_parts(from)?;
                let (to_table, to_row, new) = cell_parts(to)?;
                if table != to_table || row != to_row {
                    return Err(FsError::unsupported(format!(
                        "{from} -> {to}: columns can only be renamed within the same row"
                    )));
                }
                self.db.with(|conn| {
                    require_table(conn, from, table)?;
                    require_row(conn, from, table, row)?;
                    if !column_exists(conn, table, old)? {
                        return Err(FsError::not_found(from.to_string()));
                    }
                    if column_exists(conn, table, new)? {
                        return Err(FsError::already_exists(to.to_string()));
                    }
                    let sql = format!(
                        "ALTER TABLE {} RENAME COLUMN {} TO {}",
                        quote_ident(table),
                        quote_ident(old),
                        quote_ident(new)
                    );
                    conn.execute_batch(&sql)?;
                    Ok(())
                })
            }
            LocationKind::Record => Err(FsError::invalid_path(from.to_string())),
        }
    }

    fn remove(&self, location: &Location) -> FsResult<()> {
        tracing::debug!(%location, "remove");
        match location.kind() {
            LocationKind::Root => Err(FsError::unsupported("cannot remove the root")),
            LocationKind::Table => {
                let table = table_part(location)?;
                self.db.with(|conn| {
                    require_table(conn, location, table)?;
                    conn.execute_batch(&format!("DROP TABLE {}", quote_ident(table)))?;
                    tracing::info!(table, "dropped table");
                    Ok(())
                })
            }
            LocationKind::Row => {
                let (table, row) = row_parts(location)?;
                let rowid =
                    parse_rowid(row).ok_or_else(|| FsError::not_found(location.to_string()))?;
                self.db.with(|conn| {
                    require_table(conn, location, table)?;
                    let sql = format!("DELETE FROM {} WHERE rowid = ?1", quote_ident(table));
                    if conn.execute(&sql, params![rowid])? == 0 {
                        return Err(FsError::not_found(location.to_string()));
                    }
                    Ok(())
                })
            }
            LocationKind::Cell => {
                let (table, row, column) = cell_parts(location)?;
                self.db.with(|conn| {
                    require_table(conn, location, table)?;
                    require_row(conn, location, table, row)?;
                    if !column_exists(conn, table, column)? {
                        return Err(FsError::not_found(location.to_string()));
                    }
                    let sql = format!(
                        "ALTER TABLE {} DROP COLUMN {}",
                        quote_ident(table),
                        quote_ident(column)
                    );
                    conn.execute_batch(&sql)?;
                    tracing::info!(table, column, "dropped column");
                    Ok(())
                })
            }
            LocationKind::Record => Err(FsError::invalid_path(location.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::classify;
    use tempfile::TempDir;

    const FIXTURE: &str = r#"
        CREATE TABLE users (name TEXT, age INTEGER, score REAL, avatar BLOB);
        INSERT INTO users (rowid, name, age, score, avatar) VALUES (1, 'ada', 36, 9.5, x'00ff');
        INSERT INTO users (rowid, name, age, score, avatar) VALUES (2, NULL, NULL, NULL, NULL);
        CREATE TABLE notes (body TEXT);
    "#;

    fn fixture() -> (TempDir, SqliteBackend) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        Connection::open(&path)
            .unwrap()
            .execute_batch(FIXTURE)
            .unwrap();
        let mut backend = SqliteBackend::new();
        backend.open(&path).unwrap();
        (dir, backend)
    }

    fn loc(path: &str) -> Location {
        classify(Schema::Relational, path).unwrap()
    }

    #[test]
    fn test_parse_rowid() {
        assert_eq!(parse_rowid("1"), Some(1));
        assert_eq!(parse_rowid("-3"), Some(-3));
        assert_eq!(parse_rowid("01"), None);
        assert_eq!(parse_rowid("+1"), None);
        assert_eq!(parse_rowid("one"), None);
    }

    #[test]
    fn test_list_levels() {
        let (_dir, backend) = fixture();
        assert_eq!(backend.list_children(&loc("/")).unwrap(), vec!["notes", "users"]);
        assert_eq!(backend.list_children(&loc("/users")).unwrap(), vec!["1", "2"]);
        assert_eq!(
            backend.list_children(&loc("/users/1")).unwrap(),
            vec!["name", "age", "score", "avatar"]
        );
        assert!(backend.list_children(&loc("/notes")).unwrap().is_empty());
    }

    #[test]
    fn test_missing_containers() {
        let (_dir, backend) = fixture();
        let missing = ["/nope", "/users/99", "/users/abc", "/nope/1"];
        for path in missing {
            assert!(
                matches!(backend.list_children(&loc(path)), Err(FsError::NotFound(_))),
                "{path}"
            );
        }
    }

    #[test]
    fn test_cell_rendering() {
        let (_dir, backend) = fixture();
        assert_eq!(backend.read_leaf(&loc("/users/1/name")).unwrap(), b"ada");
        assert_eq!(backend.read_leaf(&loc("/users/1/age")).unwrap(), b"36");
        assert_eq!(backend.read_leaf(&loc("/users/1/score")).unwrap(), b"9.5");
        assert_eq!(backend.read_leaf(&loc("/users/1/avatar")).unwrap(), vec![0x00, 0xff]);
        assert!(backend.read_leaf(&loc("/users/2/name")).unwrap().is_empty());
        assert!(matches!(
            backend.read_leaf(&loc("/users/1/missing")),
            Err(FsError::NotFound(_))
        ));
        assert!(matches!(
            backend.read_leaf(&loc("/users/9/name")),
            Err(FsError::NotFound(_))
        ));
    }

    #[test]
    fn test_write_text_and_blob() {
        let (_dir, backend) = fixture();
        backend.write_leaf(&loc("/users/2/name"), b"grace").unwrap();
        assert_eq!(backend.read_leaf(&loc("/users/2/name")).unwrap(), b"grace");

        backend.write_leaf(&loc("/users/2/avatar"), &[0xff, 0xfe, 0x00]).unwrap();
        assert_eq!(
            backend.read_leaf(&loc("/users/2/avatar")).unwrap(),
            vec![0xff, 0xfe, 0x00]
        );

        assert!(matches!(
            backend.write_leaf(&loc("/users/9/name"), b"x"),
            Err(FsError::NotFound(_))
        ));
    }

    #[test]
    fn test_create_row_and_column() {
        let (_dir, backend) = fixture();
        backend.create(&loc("/users/10")).unwrap();
        assert!(backend.read_leaf(&loc("/users/10/name")).unwrap().is_empty());
        assert!(matches!(backend.create(&loc("/users/10")), Err(FsError::AlreadyExists(_))));
        assert!(matches!(backend.create(&loc("/users/ten")), Err(FsError::InvalidPath(_))));

        backend.create(&loc("/users/1/email")).unwrap();
        assert!(backend.read_leaf(&loc("/users/1/email")).unwrap().is_empty());
        assert!(matches!(
            backend.create(&loc("/users/1/email")),
            Err(FsError::AlreadyExists(_))
        ));

        assert!(matches!(backend.create(&loc("/fresh")), Err(FsError::Unsupported(_))));
        assert!(matches!(backend.create(&loc("/")), Err(FsError::AlreadyExists(_))));
    }

    #[test]
    fn test_renames() {
        let (_dir, backend) = fixture();
        backend.rename(&loc("/notes"), &loc("/memos")).unwrap();
        assert_eq!(backend.list_children(&loc("/")).unwrap(), vec!["memos", "users"]);

        backend.rename(&loc("/users/2"), &loc("/users/20")).unwrap();
        assert_eq!(backend.list_children(&loc("/users")).unwrap(), vec!["1", "20"]);

        backend.rename(&loc("/users/1/name"), &loc("/users/1/handle")).unwrap();
        assert_eq!(backend.read_leaf(&loc("/users/1/handle")).unwrap(), b"ada");

        assert!(matches!(
            backend.rename(&loc("/users/1"), &loc("/memos/1")),
            Err(FsError::Unsupported(_))
        ));
        assert!(matches!(
            backend.rename(&loc("/users/1/age"), &loc("/users/20/years")),
            Err(FsError::Unsupported(_))
        ));
        assert!(matches!(
            backend.rename(&loc("/users"), &loc("/users/1")),
            Err(FsError::CrossKind { .. })
        ));
        assert!(matches!(
            backend.rename(&loc("/users"), &loc("/memos")),
            Err(FsError::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_removes() {
        let (_dir, backend) = fixture();
        backend.remove(&loc("/users/1/score")).unwrap();
        assert_eq!(
            backend.list_children(&loc("/users/1")).unwrap(),
            vec!["name", "age", "avatar"]
        );

        backend.remove(&loc("/users/2")).unwrap();
        assert!(matches!(backend.remove(&loc("/users/2")), Err(FsError::NotFound(_))));

        backend.remove(&loc("/notes")).unwrap();
        assert_eq!(backend.list_children(&loc("/")).unwrap(), vec!["users"]);
        assert!(matches!(backend.remove(&loc("/")), Err(FsError::Unsupported(_))));
    }

    #[test]
    fn test_cell_changes_need_an_existing_row() {
        let (_dir, backend) = fixture();
        let columns = vec!["name", "age", "score", "avatar"];
        for row in ["99", "abc", "01"] {
            let cell = loc(&format!("/users/{row}/score"));
            let renamed = loc(&format!("/users/{row}/points"));
            assert!(matches!(backend.remove(&cell), Err(FsError::NotFound(_))), "{row}");
            assert!(
                matches!(backend.rename(&cell, &renamed), Err(FsError::NotFound(_))),
                "{row}"
            );
            assert!(matches!(backend.create(&renamed), Err(FsError::NotFound(_))), "{row}");
        }
        assert_eq!(backend.list_children(&loc("/users/1")).unwrap(), columns);
        assert!(matches!(
            backend.remove(&loc("/nope/1/score")),
            Err(FsError::NotFound(_))
        ));
    }

    #[test]
    fn test_without_rowid_tables_are_hidden() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mixed.db");
        Connection::open(&path)
            .unwrap()
            .execute_batch(
                "CREATE TABLE good (c);
                 CREATE TABLE pairs (k TEXT PRIMARY KEY, v) WITHOUT ROWID;
                 INSERT INTO pairs VALUES ('a', 1);
                 CREATE VIEW good_view AS SELECT c FROM good;",
            )
            .unwrap();
        let mut backend = SqliteBackend::new();
        backend.open(&path).unwrap();

        assert_eq!(backend.list_children(&loc("/")).unwrap(), vec!["good"]);
        assert!(matches!(
            backend.list_children(&loc("/pairs")),
            Err(FsError::NotFound(_))
        ));
        assert!(matches!(backend.remove(&loc("/pairs")), Err(FsError::NotFound(_))));
    }

    #[test]
    fn test_real_cells_render_like_sqlite() {
        let (_dir, backend) = fixture();
        backend
            .db
            .with(|conn| Ok(conn.execute_batch("UPDATE users SET score = 1.0 WHERE rowid = 2")?))
            .unwrap();
        assert_eq!(backend.read_leaf(&loc("/users/2/score")).unwrap(), b"1.0");
    }

    #[test]
    fn test_open_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = SqliteBackend::new();
        let err = backend.open(&dir.path().join("absent.db")).unwrap_err();
        assert!(matches!(err, FsError::Backend(_)));
        assert!(!backend.is_open());
    }

    #[test]
    fn test_open_non_database_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.db");
        std::fs::write(&path, b"this is definitely not an sqlite database file").unwrap();
        let mut backend = SqliteBackend::new();
        assert!(matches!(backend.open(&path), Err(FsError::Backend(_))));
        assert!(!backend.is_open());
    }

    #[test]
    fn test_closed_backend_fails() {
        let (_dir, mut backend) = fixture();
        backend.close();
        assert!(matches!(backend.list_children(&loc("/")), Err(FsError::Backend(_))));
    }
}
