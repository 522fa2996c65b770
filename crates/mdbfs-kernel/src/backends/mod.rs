//! Database backends.
//!
//! Backends implement [`Backend`](crate::Backend) for different database
//! libraries. Both current backends sit on SQLite through rusqlite.

mod handle;
mod kv;
mod sqlite;

pub use kv::KvBackend;
pub use sqlite::SqliteBackend;
