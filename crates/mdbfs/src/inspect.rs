//! One-shot inspection commands: `ls`, `cat` and `stat` without mounting.

use std::io::Write;

use anyhow::Result;
use mdbfs_kernel::{DirEntry, FileAttr, FileType, MappedFs};

/// `ls -l` style permission string, e.g. `drwxr-xr-x`.
pub fn mode_string(attr: &FileAttr) -> String {
    let mut out = String::with_capacity(10);
    out.push(match attr.kind {
        FileType::Directory => 'd',
        FileType::File => '-',
    });
    for shift in [6, 3, 0] {
        let bits = (attr.perm >> shift) & 0o7;
        out.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        out.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        out.push(if bits & 0o1 != 0 { 'x' } else { '-' });
    }
    out
}

/// One listing line.
pub fn format_entry(entry: &DirEntry) -> String {
    format!(
        "{} {:>3} {:>10} {}",
        mode_string(&entry.attr),
        entry.attr.nlink,
        entry.attr.size,
        entry.name
    )
}

/// List a directory, one entry per line.
pub fn ls(fs: &MappedFs, path: &str, out: &mut impl Write) -> Result<()> {
    for entry in fs.readdir(path)? {
        writeln!(out, "{}", format_entry(&entry))?;
    }
    Ok(())
}

/// Copy a leaf's bytes to `out`.
pub fn cat(fs: &MappedFs, path: &str, out: &mut impl Write) -> Result<()> {
    let value = fs.read_all(path)?;
    out.write_all(&value)?;
    Ok(())
}

/// Print the attributes of one entry.
pub fn stat(fs: &MappedFs, path: &str, out: &mut impl Write) -> Result<()> {
    let attr = fs.getattr(path)?;
    let location = fs.locate(path)?;
    let kind = match attr.kind {
        FileType::Directory => "directory",
        FileType::File => "regular file",
    };
    writeln!(out, "  File: {location}")?;
    writeln!(out, "  Kind: {}", location.kind())?;
    writeln!(out, "  Size: {:<12} Type: {kind}", attr.size)?;
    writeln!(out, "Access: ({:04o}/{})  Links: {}", attr.perm, mode_string(&attr), attr.nlink)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_string() {
        assert_eq!(mode_string(&FileAttr::directory()), "drwxr-xr-x");
        assert_eq!(mode_string(&FileAttr::file(3)), "-rw-r--r--");
    }

    #[test]
    fn test_format_entry() {
        let line = format_entry(&DirEntry::new("foo", FileAttr::file(3)));
        assert!(line.starts_with("-rw-r--r--"));
        assert!(line.ends_with(" 3 foo"));
    }
}
