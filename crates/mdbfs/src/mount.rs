//! FUSE bridge.
//!
//! The kernel's [`MappedFs`] is path based; FUSE speaks inodes. The bridge
//! keeps an inode table that hands out a stable inode per path and forwards
//! every callback to `MappedFs` by path.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
#[cfg(feature = "fuse")]
use anyhow::Context;
use mdbfs_kernel::MappedFs;

use crate::config::MountConfig;

const ROOT_INODE: u64 = 1;

/// Mount `fs` at `at` and serve requests until unmounted.
pub fn mount(fs: MappedFs, at: &Path, options: &MountConfig) -> Result<()> {
    #[cfg(feature = "fuse")]
    {
        let mut mount_options = vec![
            fuser::MountOption::FSName(options.fsname.clone()),
            fuser::MountOption::Subtype(fs.backend().name().to_string()),
        ];
        if options.auto_unmount {
            mount_options.push(fuser::MountOption::AutoUnmount);
        }
        if options.allow_other {
            mount_options.push(fuser::MountOption::AllowOther);
        }
        tracing::info!(mountpoint = %at.display(), fsname = %options.fsname, "mounting");
        fuser::mount2(fuse::MdbFuse::new(fs), at, &mount_options)
            .with_context(|| format!("mount {}", at.display()))?;
        Ok(())
    }
    #[cfg(not(feature = "fuse"))]
    {
        let _ = fs;
        let _ = at;
        let _ = options;
        Err(anyhow::anyhow!(
            "fuse support disabled; rebuild mdbfs with --features fuse or use ls/cat/stat"
        ))
    }
}

/// Join a directory path and a child name.
pub fn child_path(parent: &str, name: &str) -> String {
    if parent == "/" {
        format!("/{name}")
    } else {
        format!("{parent}/{name}")
    }
}

/// One known inode: its current path and the kernel's lookup count.
#[derive(Debug)]
struct InodeEntry {
    path: String,
    lookups: u64,
}

/// Bidirectional inode/path map.
///
/// An inode lives while the kernel holds lookups on it. `forget` drops it
/// once the count reaches zero; the root is never dropped.
#[derive(Debug)]
pub struct InodeTable {
    by_inode: HashMap<u64, InodeEntry>,
    by_path: HashMap<String, u64>,
    next_inode: u64,
}

impl Default for InodeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl InodeTable {
    pub fn new() -> Self {
        let mut table = Self {
            by_inode: HashMap::new(),
            by_path: HashMap::new(),
            next_inode: ROOT_INODE + 1,
        };
        table.by_inode.insert(
            ROOT_INODE,
            InodeEntry {
                path: "/".to_string(),
                lookups: 1,
            },
        );
        table.by_path.insert("/".to_string(), ROOT_INODE);
        table
    }

    /// Inode for `path` handed to the kernel, counting one lookup.
    pub fn lookup(&mut self, path: &str) -> u64 {
        let inode = match self.by_path.get(path) {
            Some(inode) => *inode,
            None => {
                let inode = self.allocate();
                self.by_inode.insert(
                    inode,
                    InodeEntry {
                        path: path.to_string(),
                        lookups: 0,
                    },
                );
                self.by_path.insert(path.to_string(), inode);
                inode
            }
        };
        if let Some(entry) = self.by_inode.get_mut(&inode) {
            entry.lookups = entry.lookups.saturating_add(1);
        }
        inode
    }

    /// Inode number for a directory listing. Known paths keep their inode;
    /// unknown ones get a fresh number that is not recorded.
    pub fn listing_inode(&mut self, path: &str) -> u64 {
        match self.by_path.get(path) {
            Some(inode) => *inode,
            None => self.allocate(),
        }
    }

    pub fn inode_for(&self, path: &str) -> Option<u64> {
        self.by_path.get(path).copied()
    }

    pub fn path_for(&self, inode: u64) -> Option<&str> {
        self.by_inode.get(&inode).map(|entry| entry.path.as_str())
    }

    pub fn len(&self) -> usize {
        self.by_inode.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_inode.is_empty()
    }

    /// Release `nlookup` kernel references to `inode`.
    pub fn forget(&mut self, inode: u64, nlookup: u64) {
        if inode == ROOT_INODE {
            return;
        }
        let Some(entry) = self.by_inode.get_mut(&inode) else {
            return;
        };
        entry.lookups = entry.lookups.saturating_sub(nlookup);
        if entry.lookups == 0 {
            if let Some(entry) = self.by_inode.remove(&inode) {
                if self.by_path.get(&entry.path) == Some(&inode) {
                    self.by_path.remove(&entry.path);
                }
            }
        }
    }

    /// Detach `path` and everything below it from their inodes.
    ///
    /// Their inodes resolve to ENOENT until the kernel forgets them.
    pub fn remove(&mut self, path: &str) {
        if path == "/" {
            return;
        }
        let doomed: Vec<String> = self
            .by_path
            .keys()
            .filter(|p| is_within(p, path))
            .cloned()
            .collect();
        for p in doomed {
            if let Some(inode) = self.by_path.remove(&p) {
                self.by_inode.remove(&inode);
            }
        }
    }

    /// Re-point `from` and its descendants at `to`, keeping their inodes.
    pub fn rename(&mut self, from: &str, to: &str) {
        self.remove(to);
        let moved: Vec<(String, u64)> = self
            .by_path
            .iter()
            .filter(|(p, _)| is_within(p, from))
            .map(|(p, inode)| (p.clone(), *inode))
            .collect();
        for (old, inode) in moved {
            let new = format!("{to}{}", &old[from.len()..]);
            self.by_path.remove(&old);
            self.by_path.insert(new.clone(), inode);
            if let Some(entry) = self.by_inode.get_mut(&inode) {
                entry.path = new;
            }
        }
    }

    fn allocate(&mut self) -> u64 {
        let inode = self.next_inode;
        self.next_inode = self.next_inode.saturating_add(1);
        inode
    }
}

fn is_within(path: &str, ancestor: &str) -> bool {
    path == ancestor
        || path
            .strip_prefix(ancestor)
            .is_some_and(|rest| rest.starts_with('/'))
}

#[cfg(feature = "fuse")]
mod fuse {
    use std::ffi::OsStr;
    use std::time::Duration;

    use mdbfs_kernel::{FileAttr, FileType, FsError, MappedFs};

    use super::{child_path, InodeTable};

    const TTL: Duration = Duration::from_secs(1);

    pub(super) struct MdbFuse {
        fs: MappedFs,
        inodes: InodeTable,
        uid: u32,
        gid: u32,
    }

    impl MdbFuse {
        pub(super) fn new(fs: MappedFs) -> Self {
            Self {
                fs,
                inodes: InodeTable::new(),
                uid: 0,
                gid: 0,
            }
        }

        fn fuse_attr(&self, inode: u64, attr: &FileAttr) -> fuser::FileAttr {
            fuser::FileAttr {
                ino: inode,
                size: attr.size,
                blocks: attr.size.div_ceil(512),
                atime: attr.mtime,
                mtime: attr.mtime,
                ctime: attr.mtime,
                crtime: attr.mtime,
                kind: match attr.kind {
                    FileType::Directory => fuser::FileType::Directory,
                    FileType::File => fuser::FileType::RegularFile,
                },
                perm: attr.perm as u16,
                nlink: attr.nlink,
                uid: self.uid,
                gid: self.gid,
                rdev: 0,
                flags: 0,
                blksize: 512,
            }
        }

        fn path(&self, inode: u64) -> Result<String, i32> {
            self.inodes
                .path_for(inode)
                .map(str::to_string)
                .ok_or(libc::ENOENT)
        }

        fn child(&self, parent: u64, name: &OsStr) -> Result<String, i32> {
            let parent = self.path(parent)?;
            let name = name.to_str().ok_or(libc::EINVAL)?;
            Ok(child_path(&parent, name))
        }

        /// getattr for a reply that hands an inode to the kernel.
        fn entry(&mut self, path: &str) -> Result<fuser::FileAttr, i32> {
            let attr = self.stat(path)?;
            let inode = self.inodes.lookup(path);
            Ok(self.fuse_attr(inode, &attr))
        }

        /// getattr for an inode the kernel already holds.
        fn attr(&mut self, inode: u64, path: &str) -> Result<fuser::FileAttr, i32> {
            let attr = self.stat(path)?;
            Ok(self.fuse_attr(inode, &attr))
        }

        /// getattr by path. Paths that vanished behind our back, through
        /// another writer of the database, are dropped from the inode table.
        fn stat(&mut self, path: &str) -> Result<FileAttr, i32> {
            match self.fs.getattr(path) {
                Ok(attr) => Ok(attr),
                Err(e) => {
                    if matches!(e, FsError::NotFound(_)) {
                        self.inodes.remove(path);
                    }
                    Err(errno(&e))
                }
            }
        }
    }

    fn errno(e: &FsError) -> i32 {
        match e {
            FsError::NotFound(_) => tracing::debug!(error = %e, "fuse request failed"),
            _ => tracing::warn!(error = %e, "fuse request failed"),
        }
        e.errno()
    }

    impl fuser::Filesystem for MdbFuse {
        fn init(
            &mut self,
            req: &fuser::Request<'_>,
            _config: &mut fuser::KernelConfig,
        ) -> Result<(), libc::c_int> {
            self.uid = req.uid();
            self.gid = req.gid();
            Ok(())
        }

        fn destroy(&mut self) {
            tracing::info!("unmounting");
            self.fs.destroy();
        }

        fn forget(&mut self, _req: &fuser::Request<'_>, inode: u64, nlookup: u64) {
            self.inodes.forget(inode, nlookup);
        }

        fn lookup(
            &mut self,
            _req: &fuser::Request<'_>,
            parent: u64,
            name: &OsStr,
            reply: fuser::ReplyEntry,
        ) {
            match self.child(parent, name).and_then(|path| self.entry(&path)) {
                Ok(attr) => reply.entry(&TTL, &attr, 0),
                Err(code) => reply.error(code),
            }
        }

        fn getattr(
            &mut self,
            _req: &fuser::Request<'_>,
            inode: u64,
            _fh: Option<u64>,
            reply: fuser::ReplyAttr,
        ) {
            match self.path(inode).and_then(|path| self.attr(inode, &path)) {
                Ok(attr) => reply.attr(&TTL, &attr),
                Err(code) => reply.error(code),
            }
        }

        fn setattr(
            &mut self,
            _req: &fuser::Request<'_>,
            inode: u64,
            _mode: Option<u32>,
            _uid: Option<u32>,
            _gid: Option<u32>,
            size: Option<u64>,
            _atime: Option<fuser::TimeOrNow>,
            _mtime: Option<fuser::TimeOrNow>,
            _ctime: Option<std::time::SystemTime>,
            _fh: Option<u64>,
            _crtime: Option<std::time::SystemTime>,
            _chgtime: Option<std::time::SystemTime>,
            _bkuptime: Option<std::time::SystemTime>,
            _flags: Option<u32>,
            reply: fuser::ReplyAttr,
        ) {
            let result = self.path(inode).and_then(|path| {
                // O_TRUNC arrives as a size change; other attributes are fixed.
                if let Some(size) = size {
                    self.fs.truncate(&path, size).map_err(|e| errno(&e))?;
                }
                self.attr(inode, &path)
            });
            match result {
                Ok(attr) => reply.attr(&TTL, &attr),
                Err(code) => reply.error(code),
            }
        }

        fn readdir(
            &mut self,
            _req: &fuser::Request<'_>,
            inode: u64,
            _fh: u64,
            offset: i64,
            mut reply: fuser::ReplyDirectory,
        ) {
            let path = match self.path(inode) {
                Ok(path) => path,
                Err(code) => {
                    reply.error(code);
                    return;
                }
            };
            let dots = [
                (inode, ".".to_string()),
                (super::ROOT_INODE, "..".to_string()),
            ];
            let mut index: i64 = 0;
            for (ino, name) in dots {
                index += 1;
                if index > offset && reply.add(ino, index, fuser::FileType::Directory, name) {
                    reply.ok();
                    return;
                }
            }

            let inodes = &mut self.inodes;
            let result = self.fs.readdir_with(&path, |name, attr| {
                index += 1;
                if index <= offset {
                    return false;
                }
                let ino = inodes.listing_inode(&child_path(&path, name));
                let kind = match attr.kind {
                    FileType::Directory => fuser::FileType::Directory,
                    FileType::File => fuser::FileType::RegularFile,
                };
                reply.add(ino, index, kind, name)
            });
            match result {
                Ok(()) => reply.ok(),
                Err(e) => reply.error(errno(&e)),
            }
        }

        fn read(
            &mut self,
            _req: &fuser::Request<'_>,
            inode: u64,
            _fh: u64,
            offset: i64,
            size: u32,
            _flags: i32,
            _lock_owner: Option<u64>,
            reply: fuser::ReplyData,
        ) {
            let Ok(offset) = u64::try_from(offset) else {
                reply.error(libc::EINVAL);
                return;
            };
            let result = self
                .path(inode)
                .and_then(|path| self.fs.read(&path, offset, size).map_err(|e| errno(&e)));
            match result {
                Ok(data) => reply.data(&data),
                Err(code) => reply.error(code),
            }
        }

        fn write(
            &mut self,
            _req: &fuser::Request<'_>,
            inode: u64,
            _fh: u64,
            offset: i64,
            data: &[u8],
            _write_flags: u32,
            _flags: i32,
            _lock_owner: Option<u64>,
            reply: fuser::ReplyWrite,
        ) {
            let Ok(offset) = u64::try_from(offset) else {
                reply.error(libc::EINVAL);
                return;
            };
            let result = self
                .path(inode)
                .and_then(|path| self.fs.write(&path, offset, data).map_err(|e| errno(&e)));
            match result {
                Ok(written) => reply.written(u32::try_from(written).unwrap_or(u32::MAX)),
                Err(code) => reply.error(code),
            }
        }

        fn mknod(
            &mut self,
            _req: &fuser::Request<'_>,
            parent: u64,
            name: &OsStr,
            _mode: u32,
            _umask: u32,
            _rdev: u32,
            reply: fuser::ReplyEntry,
        ) {
            let result = self.child(parent, name).and_then(|path| {
                self.fs.mknod(&path).map_err(|e| errno(&e))?;
                self.entry(&path)
            });
            match result {
                Ok(attr) => reply.entry(&TTL, &attr, 0),
                Err(code) => reply.error(code),
            }
        }

        fn create(
            &mut self,
            _req: &fuser::Request<'_>,
            parent: u64,
            name: &OsStr,
            _mode: u32,
            _umask: u32,
            _flags: i32,
            reply: fuser::ReplyCreate,
        ) {
            let result = self.child(parent, name).and_then(|path| {
                self.fs.create(&path).map_err(|e| errno(&e))?;
                self.entry(&path)
            });
            match result {
                Ok(attr) => reply.created(&TTL, &attr, 0, 0, 0),
                Err(code) => reply.error(code),
            }
        }

        fn mkdir(
            &mut self,
            _req: &fuser::Request<'_>,
            parent: u64,
            name: &OsStr,
            _mode: u32,
            _umask: u32,
            reply: fuser::ReplyEntry,
        ) {
            let result = self.child(parent, name).and_then(|path| {
                self.fs.mkdir(&path).map_err(|e| errno(&e))?;
                self.entry(&path)
            });
            match result {
                Ok(attr) => reply.entry(&TTL, &attr, 0),
                Err(code) => reply.error(code),
            }
        }

        fn unlink(
            &mut self,
            _req: &fuser::Request<'_>,
            parent: u64,
            name: &OsStr,
            reply: fuser::ReplyEmpty,
        ) {
            let result = self.child(parent, name).and_then(|path| {
                self.fs.unlink(&path).map_err(|e| errno(&e))?;
                self.inodes.remove(&path);
                Ok(())
            });
            match result {
                Ok(()) => reply.ok(),
                Err(code) => reply.error(code),
            }
        }

        fn rmdir(
            &mut self,
            _req: &fuser::Request<'_>,
            parent: u64,
            name: &OsStr,
            reply: fuser::ReplyEmpty,
        ) {
            let result = self.child(parent, name).and_then(|path| {
                self.fs.rmdir(&path).map_err(|e| errno(&e))?;
                self.inodes.remove(&path);
                Ok(())
            });
            match result {
                Ok(()) => reply.ok(),
                Err(code) => reply.error(code),
            }
        }

        fn rename(
            &mut self,
            _req: &fuser::Request<'_>,
            parent: u64,
            name: &OsStr,
            newparent: u64,
            newname: &OsStr,
            _flags: u32,
            reply: fuser::ReplyEmpty,
        ) {
            let result = self.child(parent, name).and_then(|from| {
                let to = self.child(newparent, newname)?;
                self.fs.rename(&from, &to).map_err(|e| errno(&e))?;
                self.inodes.rename(&from, &to);
                Ok(())
            });
            match result {
                Ok(()) => reply.ok(),
                Err(code) => reply.error(code),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_path() {
        assert_eq!(child_path("/", "t"), "/t");
        assert_eq!(child_path("/t", "1"), "/t/1");
    }

    #[test]
    fn test_inode_table_stable() {
        let mut table = InodeTable::new();
        assert_eq!(table.path_for(ROOT_INODE), Some("/"));
        let a = table.lookup("/a");
        assert_eq!(table.lookup("/a"), a);
        assert_ne!(table.lookup("/b"), a);
        assert_eq!(table.path_for(a), Some("/a"));
        assert_eq!(table.listing_inode("/a"), a);
    }

    #[test]
    fn test_inode_table_forget_releases_lookups() {
        let mut table = InodeTable::new();
        let a = table.lookup("/a");
        table.lookup("/a");
        table.forget(a, 1);
        assert_eq!(table.path_for(a), Some("/a"));
        table.forget(a, 1);
        assert_eq!(table.path_for(a), None);
        assert_eq!(table.inode_for("/a"), None);
        assert_eq!(table.len(), 1);

        table.forget(ROOT_INODE, 10);
        assert_eq!(table.path_for(ROOT_INODE), Some("/"));
        // Unknown inodes are ignored.
        table.forget(9999, 1);
    }

    #[test]
    fn test_listing_does_not_grow_table() {
        let mut table = InodeTable::new();
        let first = table.listing_inode("/t/1");
        let second = table.listing_inode("/t/2");
        assert_ne!(first, second);
        assert_ne!(first, ROOT_INODE);
        assert_eq!(table.len(), 1);
        assert_eq!(table.inode_for("/t/1"), None);
    }

    #[test]
    fn test_inode_table_remove_subtree() {
        let mut table = InodeTable::new();
        let t = table.lookup("/t");
        let row = table.lookup("/t/1");
        let other = table.lookup("/tt");
        table.remove("/t");
        assert_eq!(table.path_for(t), None);
        assert_eq!(table.path_for(row), None);
        assert_eq!(table.path_for(other), Some("/tt"));
        // Forgetting a removed inode is harmless.
        table.forget(t, 1);
        table.remove("/");
        assert_eq!(table.path_for(ROOT_INODE), Some("/"));
    }

    #[test]
    fn test_inode_table_rename_subtree() {
        let mut table = InodeTable::new();
        let t = table.lookup("/t1");
        let cell = table.lookup("/t1/1/c");
        let stale = table.lookup("/t2");
        table.rename("/t1", "/t2");
        assert_eq!(table.path_for(t), Some("/t2"));
        assert_eq!(table.path_for(cell), Some("/t2/1/c"));
        assert_eq!(table.path_for(stale), None);
        assert_eq!(table.lookup("/t2"), t);

        // Lookup counts move with the inode.
        table.forget(cell, 1);
        assert_eq!(table.inode_for("/t2/1/c"), None);
    }
}
