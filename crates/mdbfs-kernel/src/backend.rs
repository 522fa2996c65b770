//! Backend capability trait.
//!
//! Every database adapter answers the same small set of location-based
//! operations. The [`MappedFs`](crate::MappedFs) adapter turns host callbacks
//! into calls on this trait after classifying the path.
//!
//! Locations handed to a backend are always classified against the backend's
//! own [`Schema`], so their segment count matches their kind.

use std::path::Path;

use crate::error::FsResult;
use crate::location::{Location, Schema};

/// Core backend operations trait.
///
/// A backend owns at most one open database handle, acquired by
/// [`open`](Backend::open) and released by [`close`](Backend::close).
/// Operations called while no handle is open fail with a backend error.
pub trait Backend: Send + Sync {
    // ========================================================================
    // Identity
    // ========================================================================

    /// Stable backend name, as registered in the registry.
    fn name(&self) -> &'static str;

    /// One-line human-readable description.
    fn description(&self) -> &'static str;

    /// Longer usage notes, if the backend has any.
    fn help(&self) -> Option<&'static str> {
        None
    }

    /// Backend version string.
    fn version(&self) -> &'static str;

    /// Hierarchy shape used to classify paths for this backend.
    fn schema(&self) -> Schema;

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Open the database at `path`, replacing any handle already open.
    fn open(&mut self, path: &Path) -> FsResult<()>;

    /// Close the database. Closing a closed backend is a no-op.
    fn close(&mut self);

    /// Returns true while a database handle is open.
    fn is_open(&self) -> bool;

    // ========================================================================
    // Capabilities
    // ========================================================================

    /// True for every kind except the leaf kind.
    fn is_container(&self, location: &Location) -> bool {
        location.is_container()
    }

    /// Names of the children of a container.
    ///
    /// Fails with `NotFound` when the container itself does not exist and
    /// returns an empty list when it exists but has no children.
    fn list_children(&self, location: &Location) -> FsResult<Vec<String>>;

    /// Full content of a leaf.
    fn read_leaf(&self, location: &Location) -> FsResult<Vec<u8>>;

    /// Replace the full content of a leaf.
    fn write_leaf(&self, location: &Location, data: &[u8]) -> FsResult<()>;

    /// Create a new, empty node at a location that does not exist yet.
    fn create(&self, location: &Location) -> FsResult<()>;

    /// Rename between two locations of the same kind.
    fn rename(&self, from: &Location, to: &Location) -> FsResult<()>;

    /// Delete a leaf or, where the backend supports it, a whole container.
    fn remove(&self, location: &Location) -> FsResult<()>;

    // ========================================================================
    // Convenience methods (default implementations)
    // ========================================================================

    /// Check whether a location exists, using the same test as getattr.
    fn exists(&self, location: &Location) -> FsResult<bool> {
        let check = if self.is_container(location) {
            self.list_children(location).map(|_| ())
        } else {
            self.read_leaf(location).map(|_| ())
        };
        match check {
            Ok(()) => Ok(true),
            Err(crate::FsError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
