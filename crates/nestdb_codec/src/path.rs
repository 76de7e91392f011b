//! Dot-delimited key paths.
//!
//! A key such as `"guild.settings.prefix"` resolves to a root key
//! (`"guild"`), the only part a backend physically stores, and a nested
//! path (`["settings", "prefix"]`) addressed inside the stored value.

use crate::error::{CodecError, CodecResult};
use std::fmt;
use std::str::FromStr;

/// Separator between path segments.
pub const SEPARATOR: char = '.';

/// A parsed, non-empty key path.
///
/// # Invariants
///
/// - There is always at least one segment (the root key)
/// - No segment is empty
/// - The root key contains at least one printable character
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPath {
    segments: Vec<String>,
}

impl KeyPath {
    /// Parses a dot-delimited key.
    ///
    /// Segments after the root are kept verbatim; whether a numeric
    /// segment addresses a sequence index is decided only when the path
    /// is applied to a value.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidKey`] when the key is empty, has an
    /// empty segment (`".a"`, `"a..b"`, `"a."`), or its root segment has
    /// no printable character.
    pub fn parse(key: &str) -> CodecResult<Self> {
        if key.is_empty() {
            return Err(CodecError::invalid_key(key, "key must not be empty"));
        }

        let segments: Vec<String> = key.split(SEPARATOR).map(str::to_string).collect();

        if let Some(pos) = segments.iter().position(String::is_empty) {
            return Err(CodecError::invalid_key(
                key,
                format!("segment {pos} is empty"),
            ));
        }

        if !segments[0].chars().any(|c| !c.is_whitespace() && !c.is_control()) {
            return Err(CodecError::invalid_key(
                key,
                "root key has no printable characters",
            ));
        }

        Ok(Self { segments })
    }

    /// Builds a path from a root key alone.
    ///
    /// # Errors
    ///
    /// Same rules as [`KeyPath::parse`]; a root containing the separator
    /// is rejected.
    pub fn root_only(root: &str) -> CodecResult<Self> {
        if root.contains(SEPARATOR) {
            return Err(CodecError::invalid_key(
                root,
                "root key must not contain a separator",
            ));
        }
        Self::parse(root)
    }

    /// The root key: the only part a backend stores.
    pub fn root(&self) -> &str {
        &self.segments[0]
    }

    /// Segments after the root key (possibly empty).
    pub fn nested(&self) -> &[String] {
        &self.segments[1..]
    }

    /// All segments, root first.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns true if the path addresses inside a record.
    pub fn is_nested(&self) -> bool {
        self.segments.len() > 1
    }

    /// Number of segments, including the root.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always false: a path has at least its root segment.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The path one level shorter, or `None` for a root-only path.
    pub fn parent(&self) -> Option<KeyPath> {
        if self.is_nested() {
            Some(Self {
                segments: self.segments[..self.segments.len() - 1].to_vec(),
            })
        } else {
            None
        }
    }

    /// The last segment.
    pub fn leaf(&self) -> &str {
        &self.segments[self.segments.len() - 1]
    }
}

impl FromStr for KeyPath {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "{SEPARATOR}")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn root_only_key() {
        let path = KeyPath::parse("guild").unwrap();
        assert_eq!(path.root(), "guild");
        assert!(path.nested().is_empty());
        assert!(!path.is_nested());
        assert!(path.parent().is_none());
    }

    #[test]
    fn nested_key() {
        let path = KeyPath::parse("a.b.c").unwrap();
        assert_eq!(path.root(), "a");
        assert_eq!(path.nested(), ["b", "c"]);
        assert_eq!(path.leaf(), "c");
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn numeric_segments_are_kept_verbatim() {
        let path = KeyPath::parse("list.0.name").unwrap();
        assert_eq!(path.nested(), ["0", "name"]);
    }

    #[test]
    fn parent_walks_up_to_root() {
        let path = KeyPath::parse("a.b.c").unwrap();
        let parent = path.parent().unwrap();
        assert_eq!(parent.to_string(), "a.b");
        let grandparent = parent.parent().unwrap();
        assert_eq!(grandparent.to_string(), "a");
        assert!(grandparent.parent().is_none());
    }

    #[test]
    fn rejects_empty_key() {
        assert!(matches!(
            KeyPath::parse(""),
            Err(CodecError::InvalidKey { .. })
        ));
    }

    #[test]
    fn rejects_empty_segments() {
        for key in [".a", "a..b", "a.", "."] {
            assert!(KeyPath::parse(key).is_err(), "{key:?} should be rejected");
        }
    }

    #[test]
    fn rejects_unprintable_root() {
        assert!(KeyPath::parse("   ").is_err());
        assert!(KeyPath::parse(" \t.a").is_err());
        assert!(KeyPath::parse("\u{7}").is_err());
    }

    #[test]
    fn root_only_rejects_separator() {
        assert!(KeyPath::root_only("a.b").is_err());
        assert_eq!(KeyPath::root_only("a").unwrap().root(), "a");
    }

    proptest! {
        #[test]
        fn display_round_trips(segments in prop::collection::vec("[a-z0-9_]{1,8}", 1..6)) {
            let key = segments.join(".");
            let path = KeyPath::parse(&key).unwrap();
            prop_assert_eq!(path.to_string(), key);
            prop_assert_eq!(path.len(), segments.len());
        }
    }
}
