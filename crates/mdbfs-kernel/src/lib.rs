//! Mapping engine for exposing databases as filesystems.
//!
//! Key components:
//!
//! - [`classify`] - turns a host path into a typed [`Location`] for a [`Schema`]
//! - [`Backend`] - the operations every database adapter answers
//! - [`BackendRegistry`] - backend names and aliases, resolved at start-up
//! - [`MappedFs`] - host callbacks (getattr, readdir, read, write, ...) on top
//!   of a backend
//!
//! ## Design Decisions
//!
//! - **Path-based, no inodes**: every callback takes a path and re-derives
//!   its location. Inode bookkeeping belongs to the host bridge.
//! - **Depth-bounded schemas**: a relational database is three levels deep
//!   (table, row, column), a key-value store one level (key). Anything deeper
//!   is an invalid path, never a lookup miss.
//! - **Whole-value writes**: a write at offset 0 replaces the leaf value;
//!   other offsets are ignored.
//!
//! ```no_run
//! use mdbfs_kernel::{BackendRegistry, MappedFs};
//!
//! let registry = BackendRegistry::builtin();
//! let backend = registry.resolve("sqlite").expect("builtin backend");
//! let fs = MappedFs::open(backend, "app.sqlite")?;
//! for entry in fs.readdir("/")? {
//!     println!("{}", entry.name);
//! }
//! # Ok::<(), mdbfs_kernel::FsError>(())
//! ```

mod backend;
pub mod backends;
mod error;
mod location;
mod ops;
mod registry;
mod types;

pub use backend::Backend;
pub use backends::{KvBackend, SqliteBackend};
pub use error::{FsError, FsResult};
pub use location::{classify, normalize, validate_segment, Location, LocationKind, Schema};
pub use ops::MappedFs;
pub use registry::{BackendFactory, BackendRegistry};
pub use types::{DirEntry, FileAttr, FileType, DIR_PERM, FILE_PERM};
