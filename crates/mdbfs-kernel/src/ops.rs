//! Filesystem operation adapter.
//!
//! [`MappedFs`] receives the host runtime's path-based callbacks, classifies
//! each path against the backend's schema and answers with backend calls.
//! Nothing is cached: every call re-queries the database.

use std::path::Path;

use crate::backend::Backend;
use crate::error::{FsError, FsResult};
use crate::location::{classify, Location, Schema};
use crate::types::{DirEntry, FileAttr};

/// A database mapped as a filesystem.
///
/// Owns one opened backend for the whole session and closes it on
/// [`destroy`](MappedFs::destroy) or drop.
pub struct MappedFs {
    backend: Box<dyn Backend>,
}

impl std::fmt::Debug for MappedFs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedFs")
            .field("backend", &self.backend.name())
            .field("open", &self.backend.is_open())
            .finish()
    }
}

impl MappedFs {
    /// Wrap a backend that is already open.
    pub fn new(backend: Box<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Open `database` with `backend` and wrap it.
    pub fn open(mut backend: Box<dyn Backend>, database: impl AsRef<Path>) -> FsResult<Self> {
        backend.open(database.as_ref())?;
        Ok(Self::new(backend))
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    pub fn schema(&self) -> Schema {
        self.backend.schema()
    }

    /// Classify a host path for this backend.
    pub fn locate(&self, path: &str) -> FsResult<Location> {
        classify(self.schema(), path).inspect_err(|e| {
            tracing::debug!(path, error = %e, "rejected path");
        })
    }

    // ========================================================================
    // Reading
    // ========================================================================

    /// Attributes of the entry at `path`.
    ///
    /// Existence of a container is the success of listing it; a leaf's size
    /// is the length of its value.
    pub fn getattr(&self, path: &str) -> FsResult<FileAttr> {
        let location = self.locate(path)?;
        self.attr_of(&location)
    }

    fn attr_of(&self, location: &Location) -> FsResult<FileAttr> {
        if self.backend.is_container(location) {
            self.backend.list_children(location)?;
            Ok(FileAttr::directory())
        } else {
            let value = self.backend.read_leaf(location)?;
            Ok(FileAttr::file(value.len() as u64))
        }
    }

    /// List a directory through a fill callback.
    ///
    /// `fill` receives each child's name and attributes and returns `true`
    /// when the host buffer is full, which ends the listing. Children that
    /// vanish between listing and getattr, or whose names cannot be a path
    /// segment, are skipped.
    pub fn readdir_with<F>(&self, path: &str, mut fill: F) -> FsResult<()>
    where
        F: FnMut(&str, &FileAttr) -> bool,
    {
        let location = self.locate(path)?;
        if !self.backend.is_container(&location) {
            return Err(FsError::not_a_directory(location.to_string()));
        }

        for name in self.backend.list_children(&location)? {
            let child = match location.child(name.as_str()) {
                Ok(child) => child,
                Err(e) => {
                    tracing::warn!(parent = %location, child = %name, error = %e, "skipping unmappable entry");
                    continue;
                }
            };
            let attr = match self.attr_of(&child) {
                Ok(attr) => attr,
                Err(FsError::NotFound(_)) => {
                    tracing::warn!(entry = %child, "entry disappeared during listing");
                    continue;
                }
                Err(e) => return Err(e),
            };
            if fill(name.as_str(), &attr) {
                tracing::debug!(%location, "readdir buffer full");
                break;
            }
        }
        Ok(())
    }

    /// List a directory into a vector.
    pub fn readdir(&self, path: &str) -> FsResult<Vec<DirEntry>> {
        let mut entries = Vec::new();
        self.readdir_with(path, |name, attr| {
            entries.push(DirEntry::new(name, attr.clone()));
            false
        })?;
        Ok(entries)
    }

    /// Read up to `size` bytes of a leaf starting at `offset`.
    pub fn read(&self, path: &str, offset: u64, size: u32) -> FsResult<Vec<u8>> {
        let location = self.leaf(path)?;
        let value = self.backend.read_leaf(&location)?;
        let len = value.len() as u64;
        if offset >= len {
            return Ok(Vec::new());
        }
        let start = offset as usize;
        let end = start + (len - offset).min(u64::from(size)) as usize;
        Ok(value[start..end].to_vec())
    }

    /// Read the full value of a leaf.
    pub fn read_all(&self, path: &str) -> FsResult<Vec<u8>> {
        let location = self.leaf(path)?;
        self.backend.read_leaf(&location)
    }

    /// Whether `path` names an existing entry.
    pub fn exists(&self, path: &str) -> FsResult<bool> {
        match self.getattr(path) {
            Ok(_) => Ok(true),
            Err(FsError::NotFound(_) | FsError::InvalidPath(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    // ========================================================================
    // Writing
    // ========================================================================

    /// Write `data` as the new full value of a leaf.
    ///
    /// Only writes at offset 0 reach the database; any other offset is
    /// accepted and ignored, reporting zero bytes written.
    pub fn write(&self, path: &str, offset: u64, data: &[u8]) -> FsResult<usize> {
        let location = self.leaf(path)?;
        if offset != 0 {
            tracing::debug!(%location, offset, "ignoring write past offset 0");
            return Ok(0);
        }
        self.backend.write_leaf(&location, data)?;
        Ok(data.len())
    }

    /// Shorten a leaf to `size` bytes. Growing a value is a no-op.
    pub fn truncate(&self, path: &str, size: u64) -> FsResult<()> {
        let location = self.leaf(path)?;
        let value = self.backend.read_leaf(&location)?;
        if size >= value.len() as u64 {
            return Ok(());
        }
        self.backend.write_leaf(&location, &value[..size as usize])
    }

    /// Create a leaf.
    pub fn mknod(&self, path: &str) -> FsResult<()> {
        let location = self.locate(path)?;
        if !location.is_leaf() {
            return Err(FsError::read_only(location.to_string()));
        }
        self.backend.create(&location)
    }

    /// Create a leaf; same as [`mknod`](Self::mknod).
    pub fn create(&self, path: &str) -> FsResult<()> {
        self.mknod(path)
    }

    /// Remove a leaf.
    pub fn unlink(&self, path: &str) -> FsResult<()> {
        let location = self.leaf(path)?;
        self.backend.remove(&location)
    }

    /// Create a container.
    pub fn mkdir(&self, path: &str) -> FsResult<()> {
        let location = self.container(path)?;
        self.backend.create(&location)
    }

    /// Remove a container and everything below it.
    pub fn rmdir(&self, path: &str) -> FsResult<()> {
        let location = self.container(path)?;
        self.backend.remove(&location)
    }

    /// Rename between two locations of the same kind.
    pub fn rename(&self, from: &str, to: &str) -> FsResult<()> {
        let from = self.locate(from)?;
        let to = self.locate(to)?;
        if from.kind() != to.kind() {
            return Err(FsError::CrossKind {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        self.backend.rename(&from, &to)
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Release the database handle. Later calls fail with a backend error.
    pub fn destroy(&mut self) {
        if self.backend.is_open() {
            self.backend.close();
        }
    }

    fn leaf(&self, path: &str) -> FsResult<Location> {
        let location = self.locate(path)?;
        if !location.is_leaf() {
            return Err(FsError::is_a_directory(location.to_string()));
        }
        Ok(location)
    }

    fn container(&self, path: &str) -> FsResult<Location> {
        let location = self.locate(path)?;
        if location.is_leaf() {
            return Err(FsError::not_a_directory(location.to_string()));
        }
        Ok(location)
    }
}

impl Drop for MappedFs {
    fn drop(&mut self) {
        self.destroy();
    }
}
