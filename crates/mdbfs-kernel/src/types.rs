//! Attribute types reported to the host runtime.
//!
//! Databases carry no ownership or timestamps, so every entry gets fixed
//! permissions and the time of the query.

use std::time::SystemTime;

/// Permission bits for leaves (rw-r--r--).
pub const FILE_PERM: u32 = 0o644;

/// Permission bits for containers (rwxr-xr-x).
pub const DIR_PERM: u32 = 0o755;

/// File type enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// Regular file (leaf location).
    File,
    /// Directory (container location).
    Directory,
}

impl FileType {
    /// Returns true if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, FileType::File)
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, FileType::Directory)
    }
}

/// File attributes (metadata).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttr {
    /// Size in bytes. Always 0 for directories.
    pub size: u64,
    /// File type.
    pub kind: FileType,
    /// Unix permissions.
    pub perm: u32,
    /// Number of hard links.
    pub nlink: u32,
    /// Time the attributes were queried.
    pub mtime: SystemTime,
}

impl FileAttr {
    /// Attributes for a leaf holding `size` bytes.
    pub fn file(size: u64) -> Self {
        Self {
            size,
            kind: FileType::File,
            perm: FILE_PERM,
            nlink: 1,
            mtime: SystemTime::now(),
        }
    }

    /// Attributes for a container.
    pub fn directory() -> Self {
        Self {
            size: 0,
            kind: FileType::Directory,
            perm: DIR_PERM,
            nlink: 2, // . and ..
            mtime: SystemTime::now(),
        }
    }

    /// Returns true if this is a regular file.
    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    /// Full `st_mode` value (type bits plus permissions).
    pub fn mode(&self) -> u32 {
        let type_bits = match self.kind {
            FileType::File => libc::S_IFREG,
            FileType::Directory => libc::S_IFDIR,
        };
        type_bits as u32 | self.perm
    }
}

/// A directory entry with the attributes of the child it names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Child name (single path segment).
    pub name: String,
    /// Attributes of the child.
    pub attr: FileAttr,
}

impl DirEntry {
    /// Create an entry.
    pub fn new(name: impl Into<String>, attr: FileAttr) -> Self {
        Self {
            name: name.into(),
            attr,
        }
    }
}
