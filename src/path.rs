//! Failure-tolerant navigation of capture attribute trees.
//!
//! Different Wireshark versions nest the same dissector fields under different
//! parents, so every field access in this crate goes through [`lookup`], which
//! treats a missing or mismatched path as an absent value rather than an error.

use serde_json::Value;

/// A single step of a path into a [`Value`] tree.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Segment<'a> {
    /// Selects a member of an object.
    Key(&'a str),
    /// Selects an element of an array.
    Index(usize),
}

impl<'a> From<&'a str> for Segment<'a> {
    fn from(key: &'a str) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for Segment<'_> {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// Follows `path` from `root` and returns the value it names.
///
/// Returns `None` if any step names a key that does not exist, an index that is out
/// of bounds, or is applied to a value of the wrong shape (e.g. an index into an object).
pub fn lookup<'v>(root: &'v Value, path: &[Segment<'_>]) -> Option<&'v Value> {
    path.iter().try_fold(root, |node, segment| match (node, segment) {
        (Value::Object(map), Segment::Key(key)) => map.get(*key),
        (Value::Array(items), Segment::Index(index)) => items.get(*index),
        _ => None,
    })
}

/// Returns the first value found among several alternative paths.
pub fn lookup_any<'v>(root: &'v Value, paths: &[&[Segment<'_>]]) -> Option<&'v Value> {
    paths.iter().find_map(|path| lookup(root, path))
}
