//! # Document Paths
//!
//! A [`DocumentPath`] names a node inside a configuration document as the
//! sequence of mapping keys and sequence indices leading to it from the
//! root. It renders as an RFC 6901 JSON pointer (`/providers/0/identification`)
//! so operators can locate the node in the file they wrote.

use serde::{Serialize, Serializer};
use serde_json::Value;

/// One step in a [`DocumentPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A key in a mapping.
    Key(String),
    /// A position in a sequence.
    Index(usize),
}

impl std::fmt::Display for PathSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // RFC 6901 escaping: `~` first, then `/`.
            Self::Key(key) => f.write_str(&key.replace('~', "~0").replace('/', "~1")),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

/// Location of a node, from the document root.
///
/// Paths are immutable; [`DocumentPath::key`] and [`DocumentPath::index`]
/// return extended copies so a walker can hand a child path to each
/// recursive call without bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DocumentPath(Vec<PathSegment>);

impl DocumentPath {
    /// The document root.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Returns this path extended by a mapping key.
    pub fn key(&self, key: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Key(key.into()));
        Self(segments)
    }

    /// Returns this path extended by a sequence index.
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Self(segments)
    }

    /// Returns the segments from the root.
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Returns true for the root path.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Renders the path as a JSON pointer. The root is the empty string.
    pub fn to_pointer(&self) -> String {
        self.0.iter().map(|segment| format!("/{segment}")).collect()
    }

    /// Looks up the node this path names inside `document`.
    pub fn resolve<'a>(&self, document: &'a Value) -> Option<&'a Value> {
        self.0
            .iter()
            .try_fold(document, |node, segment| match segment {
                PathSegment::Key(key) => node.as_object()?.get(key),
                PathSegment::Index(index) => node.as_array()?.get(*index),
            })
    }
}

impl std::fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_root() {
            f.write_str("(root)")
        } else {
            f.write_str(&self.to_pointer())
        }
    }
}

impl Serialize for DocumentPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_pointer())
    }
}
