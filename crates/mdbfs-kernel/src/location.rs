//! Path classification.
//!
//! Turns a host path such as `/users/3/email` into a typed [`Location`] for a
//! given [`Schema`]. Classification is purely syntactic: it never asks the
//! backend whether the location exists.
//!
//! ```text
//! relational:  /            Root
//!              /users       Table   [users]
//!              /users/3     Row     [users, 3]
//!              /users/3/id  Cell    [users, 3, id]
//!
//! key-value:   /            Root
//!              /foo         Record  [foo]
//! ```

use std::fmt;

use strum::Display;

use crate::error::{FsError, FsResult};

/// Characters that may never appear in a segment.
///
/// Quotes would let a name escape identifier quoting in SQL, and NUL or `/`
/// cannot be expressed as a single path segment.
const FORBIDDEN_CHARS: &[char] = &['"', '\'', '`', '\0', '/'];

/// Hierarchy shape of a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Schema {
    /// table / row / column
    Relational,
    /// record key
    KeyValue,
}

impl Schema {
    /// Location kinds of this schema, indexed by segment count.
    pub fn kinds(self) -> &'static [LocationKind] {
        match self {
            Schema::Relational => &[
                LocationKind::Root,
                LocationKind::Table,
                LocationKind::Row,
                LocationKind::Cell,
            ],
            Schema::KeyValue => &[LocationKind::Root, LocationKind::Record],
        }
    }

    /// Maximum number of segments a valid path may carry.
    pub fn depth(self) -> usize {
        self.kinds().len() - 1
    }

    /// The deepest kind, mapped to files.
    pub fn leaf_kind(self) -> LocationKind {
        self.kinds()[self.depth()]
    }

    /// Kind for a path with `segments` segments, if the schema has one.
    pub fn kind_at(self, segments: usize) -> Option<LocationKind> {
        self.kinds().get(segments).copied()
    }
}

/// Tagged location kind. Which variants are reachable depends on the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum LocationKind {
    Root,
    Table,
    Row,
    Cell,
    Record,
}

/// A classified path.
///
/// The segment count always equals the depth of `kind` within `schema`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    schema: Schema,
    kind: LocationKind,
    segments: Vec<String>,
}

impl Location {
    /// The root location of a schema.
    pub fn root(schema: Schema) -> Self {
        Self {
            schema,
            kind: LocationKind::Root,
            segments: Vec::new(),
        }
    }

    /// Build a location from already split segments.
    pub fn from_segments<S: Into<String>>(
        schema: Schema,
        segments: impl IntoIterator<Item = S>,
    ) -> FsResult<Self> {
        let mut location = Self::root(schema);
        for segment in segments {
            location = location.child(segment)?;
        }
        Ok(location)
    }

    /// The location one level below this one.
    pub fn child(&self, name: impl Into<String>) -> FsResult<Self> {
        let name = name.into();
        validate_segment(&name)?;
        let depth = self.segments.len() + 1;
        let kind = self.schema.kind_at(depth).ok_or_else(|| {
            FsError::invalid_path(format!(
                "{}/{}: more than {} components",
                self.path_prefix(),
                name,
                self.schema.depth()
            ))
        })?;
        let mut segments = self.segments.clone();
        segments.push(name);
        Ok(Self {
            schema: self.schema,
            kind,
            segments,
        })
    }

    /// The location one level up, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.segments.split_last()?;
        let kind = self.schema.kind_at(rest.len())?;
        Some(Self {
            schema: self.schema,
            kind,
            segments: rest.to_vec(),
        })
    }

    pub fn schema(&self) -> Schema {
        self.schema
    }

    pub fn kind(&self) -> LocationKind {
        self.kind
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Last segment, the name this location has inside its parent.
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn is_root(&self) -> bool {
        self.kind == LocationKind::Root
    }

    /// True for the deepest kind of the schema.
    pub fn is_leaf(&self) -> bool {
        self.kind == self.schema.leaf_kind()
    }

    pub fn is_container(&self) -> bool {
        !self.is_leaf()
    }

    /// Table name (relational schema).
    pub fn table(&self) -> Option<&str> {
        self.relational_segment(0)
    }

    /// Row identifier (relational schema).
    pub fn row(&self) -> Option<&str> {
        self.relational_segment(1)
    }

    /// Column name (relational schema).
    pub fn column(&self) -> Option<&str> {
        self.relational_segment(2)
    }

    /// Record key (key-value schema).
    pub fn key(&self) -> Option<&str> {
        match self.schema {
            Schema::KeyValue => self.segments.first().map(String::as_str),
            Schema::Relational => None,
        }
    }

    fn relational_segment(&self, index: usize) -> Option<&str> {
        match self.schema {
            Schema::Relational => self.segments.get(index).map(String::as_str),
            Schema::KeyValue => None,
        }
    }

    fn path_prefix(&self) -> String {
        if self.segments.is_empty() {
            String::new()
        } else {
            self.to_string()
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

/// Reject names that cannot be a single, quotable segment.
pub fn validate_segment(name: &str) -> FsResult<()> {
    if name.is_empty() {
        return Err(FsError::invalid_path("empty path component"));
    }
    if name == "." || name == ".." {
        return Err(FsError::invalid_path(format!("reserved name {name:?}")));
    }
    if let Some(c) = name.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return Err(FsError::invalid_path(format!(
            "{name:?} contains forbidden character {c:?}"
        )));
    }
    Ok(())
}

/// Lexically normalize an absolute path into its segments.
///
/// Collapses `.`, `..` and repeated separators. `..` at the root stays at the
/// root. A trailing separator adds nothing.
pub fn normalize(path: &str) -> FsResult<Vec<&str>> {
    if !path.starts_with('/') {
        return Err(FsError::invalid_path(format!("{path:?} is not absolute")));
    }
    let mut segments: Vec<&str> = Vec::new();
    for component in path.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            name => segments.push(name),
        }
    }
    Ok(segments)
}

/// Classify a host path against a schema.
pub fn classify(schema: Schema, path: &str) -> FsResult<Location> {
    let segments = normalize(path)?;
    if segments.len() > schema.depth() {
        tracing::debug!(path, %schema, "path deeper than schema");
        return Err(FsError::invalid_path(format!(
            "{path}: more than {} components",
            schema.depth()
        )));
    }
    Location::from_segments(schema, segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rel(path: &str) -> FsResult<Location> {
        classify(Schema::Relational, path)
    }

    fn kv(path: &str) -> FsResult<Location> {
        classify(Schema::KeyValue, path)
    }

    #[test]
    fn test_relational_kinds() {
        assert_eq!(rel("/").unwrap().kind(), LocationKind::Root);
        assert_eq!(rel("/t").unwrap().kind(), LocationKind::Table);
        assert_eq!(rel("/t/1").unwrap().kind(), LocationKind::Row);

        let cell = rel("/t/1/c").unwrap();
        assert_eq!(cell.kind(), LocationKind::Cell);
        assert_eq!(cell.table(), Some("t"));
        assert_eq!(cell.row(), Some("1"));
        assert_eq!(cell.column(), Some("c"));
        assert_eq!(cell.key(), None);
        assert!(cell.is_leaf());
    }

    #[test]
    fn test_key_value_kinds() {
        assert!(kv("/").unwrap().is_root());
        let record = kv("/foo").unwrap();
        assert_eq!(record.kind(), LocationKind::Record);
        assert_eq!(record.key(), Some("foo"));
        assert_eq!(record.table(), None);
        assert!(record.is_leaf());
    }

    #[test]
    fn test_over_depth_is_invalid() {
        assert!(matches!(rel("/a/b/c/d"), Err(FsError::InvalidPath(_))));
        assert!(matches!(kv("/a/b"), Err(FsError::InvalidPath(_))));
    }

    #[test]
    fn test_normalization() {
        assert_eq!(rel("/t/").unwrap(), rel("/t").unwrap());
        assert_eq!(rel("//t///1").unwrap(), rel("/t/1").unwrap());
        assert_eq!(rel("/t/./1/../2").unwrap(), rel("/t/2").unwrap());
        assert!(rel("/..").unwrap().is_root());
        assert!(rel("/t/..").unwrap().is_root());
        // Normalization happens before the depth check.
        assert_eq!(rel("/a/b/c/../d").unwrap(), rel("/a/b/d").unwrap());
    }

    #[test]
    fn test_relative_paths_rejected() {
        assert!(matches!(rel("t/1"), Err(FsError::InvalidPath(_))));
        assert!(matches!(rel(""), Err(FsError::InvalidPath(_))));
    }

    #[test]
    fn test_forbidden_characters() {
        assert!(matches!(rel("/t\"x"), Err(FsError::InvalidPath(_))));
        assert!(matches!(rel("/t/1/it's"), Err(FsError::InvalidPath(_))));
        assert!(matches!(kv("/a`b"), Err(FsError::InvalidPath(_))));
        assert!(matches!(kv("/a\0b"), Err(FsError::InvalidPath(_))));
    }

    #[test]
    fn test_child_validation() {
        let root = Location::root(Schema::KeyValue);
        assert!(root.child("").is_err());
        assert!(root.child("a/b").is_err());
        assert!(root.child("..").is_err());
        let record = root.child("a").unwrap();
        assert!(matches!(record.child("b"), Err(FsError::InvalidPath(_))));
    }

    #[test]
    fn test_parent() {
        let cell = rel("/t/1/c").unwrap();
        let row = cell.parent().unwrap();
        assert_eq!(row, rel("/t/1").unwrap());
        assert_eq!(row.parent().unwrap().parent().unwrap(), rel("/").unwrap());
        assert!(rel("/").unwrap().parent().is_none());
    }

    #[test]
    fn test_deterministic() {
        for path in ["/", "/t", "/t/1/c", "/a/b/c/d", "rel", "/x'y"] {
            let first = rel(path);
            let second = rel(path);
            match (first, second) {
                (Ok(a), Ok(b)) => assert_eq!(a, b),
                (Err(a), Err(b)) => assert_eq!(a.to_string(), b.to_string()),
                _ => panic!("classification of {path} is not deterministic"),
            }
        }
    }

    #[test]
    fn test_render_round_trip() {
        for path in ["/", "/t", "/t/1", "/t/1/c", "/table name/42/col-x"] {
            let location = rel(path).unwrap();
            assert_eq!(location.to_string(), path);
            assert_eq!(rel(&location.to_string()).unwrap(), location);
        }
        let record = kv("/some.key").unwrap();
        assert_eq!(kv(&record.to_string()).unwrap(), record);
    }

    #[test]
    fn test_schema_shape() {
        assert_eq!(Schema::Relational.depth(), 3);
        assert_eq!(Schema::KeyValue.depth(), 1);
        assert_eq!(Schema::Relational.leaf_kind(), LocationKind::Cell);
        assert_eq!(Schema::KeyValue.leaf_kind(), LocationKind::Record);
        assert_eq!(Schema::KeyValue.to_string(), "key-value");
        assert_eq!(LocationKind::Cell.to_string(), "cell");
    }
}
