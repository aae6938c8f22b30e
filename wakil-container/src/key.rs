//! Dotted configuration keys.
//!
//! [`DottedKey`] names a location in the configuration tree, e.g.
//! `acl.list_adapter.default`. It is also the name a delegated service
//! is registered under.

use std::fmt;
use std::str::FromStr;

use crate::error::PathNotFoundError;

/// Segment separator inside a dotted key.
pub const SEPARATOR: char = '.';

/// A non-empty, dot-separated path into the configuration.
///
/// Segments are not validated beyond the key being non-blank: a segment
/// that does not exist simply fails to resolve.
///
/// # Examples
/// ```
/// use wakil_container::key::DottedKey;
///
/// let key = DottedKey::parse("one.two.three").unwrap();
/// assert_eq!(key.segments().collect::<Vec<_>>(), ["one", "two", "three"]);
///
/// let child = key.child("four");
/// assert_eq!(child.as_str(), "one.two.three.four");
///
/// assert!(DottedKey::parse("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DottedKey {
    raw: String,
}

impl DottedKey {
    /// Parses a key, rejecting empty and whitespace-only input.
    pub fn parse(raw: &str) -> Result<Self, PathNotFoundError> {
        if raw.trim().is_empty() {
            return Err(PathNotFoundError::empty_key(raw));
        }
        Ok(Self { raw: raw.to_string() })
    }

    /// Iterates over the segments in order.
    #[inline]
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.raw.split(SEPARATOR)
    }

    /// Returns the number of segments.
    #[inline]
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// Appends one segment, producing the key of a child entry.
    pub fn child(&self, segment: &str) -> Self {
        Self {
            raw: format!("{}{SEPARATOR}{segment}", self.raw),
        }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for DottedKey {
    type Err = PathNotFoundError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for DottedKey {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}

impl From<DottedKey> for String {
    fn from(key: DottedKey) -> Self {
        key.raw
    }
}

impl fmt::Display for DottedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_segment() {
        let key = DottedKey::parse("config").unwrap();
        assert_eq!(key.depth(), 1);
        assert_eq!(key.segments().next(), Some("config"));
    }

    #[test]
    fn empty_rejected() {
        let err = DottedKey::parse("").unwrap_err();
        assert!(err.is_empty_key());
    }

    #[test]
    fn whitespace_rejected() {
        assert!(DottedKey::parse(" \t").is_err());
    }

    #[test]
    fn empty_segments_kept() {
        let key = DottedKey::parse("a..b").unwrap();
        assert_eq!(key.segments().collect::<Vec<_>>(), ["a", "", "b"]);
    }

    #[test]
    fn child_appends_segment() {
        let key: DottedKey = "x.y".parse().unwrap();
        assert_eq!(key.child("p").to_string(), "x.y.p");
        assert_eq!(key.child("p").depth(), 3);
    }

    #[test]
    fn keys_in_set() {
        use std::collections::BTreeSet;
        let set: BTreeSet<_> = ["b", "a", "b"]
            .into_iter()
            .map(|k| DottedKey::parse(k).unwrap())
            .collect();
        assert_eq!(set.len(), 2);
        assert_eq!(set.iter().next().unwrap().as_str(), "a");
    }
}
