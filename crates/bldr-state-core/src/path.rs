// ── Key paths ──
//
// A KeyPath addresses one node of the state tree by an ordered list of
// segments. Text form is dotted: `users.current.isSignedIn`.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::StateError;

/// An ordered, non-empty sequence of non-empty key segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyPath {
    segments: Vec<String>,
}

impl KeyPath {
    /// Parse a dotted path. Empty paths and empty segments are rejected.
    pub fn parse(text: &str) -> Result<Self, StateError> {
        Self::from_segments(text.split('.'))
    }

    /// Build a path from already-split segments.
    pub fn from_segments<I, S>(segments: I) -> Result<Self, StateError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(StateError::invalid_path("", "path is empty"));
        }
        if segments.iter().any(String::is_empty) {
            return Err(StateError::invalid_path(
                segments.join("."),
                "path contains an empty segment",
            ));
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Never true for a parsed path.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The last segment (the field name).
    pub fn leaf(&self) -> &str {
        self.segments.last().map_or("", String::as_str)
    }

    /// The enclosing record path, or `None` for a top-level key.
    pub fn parent(&self) -> Option<Self> {
        (self.segments.len() > 1).then(|| Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Append one segment, returning a new path.
    pub fn child(&self, segment: impl Into<String>) -> Result<Self, StateError> {
        let segment = segment.into();
        if segment.is_empty() {
            return Err(StateError::invalid_path(
                format!("{self}."),
                "path contains an empty segment",
            ));
        }
        let mut segments = self.segments.clone();
        segments.push(segment);
        Ok(Self { segments })
    }

    /// True if `self` equals `prefix` or lies underneath it.
    pub fn starts_with(&self, prefix: &KeyPath) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// Every proper ancestor, outermost first.
    pub(crate) fn ancestors(&self) -> impl Iterator<Item = KeyPath> + '_ {
        (1..self.segments.len()).map(|n| Self {
            segments: self.segments[..n].to_vec(),
        })
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

impl FromStr for KeyPath {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for KeyPath {
    type Error = StateError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl TryFrom<&[&str]> for KeyPath {
    type Error = StateError;

    fn try_from(segments: &[&str]) -> Result<Self, Self::Error> {
        Self::from_segments(segments.iter().copied())
    }
}

impl Serialize for KeyPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Anything that names a path: `&str` (dotted), segment slices, or a `KeyPath`.
pub trait IntoKeyPath {
    fn into_key_path(self) -> Result<KeyPath, StateError>;
}

impl IntoKeyPath for KeyPath {
    fn into_key_path(self) -> Result<KeyPath, StateError> {
        Ok(self)
    }
}

impl IntoKeyPath for &KeyPath {
    fn into_key_path(self) -> Result<KeyPath, StateError> {
        Ok(self.clone())
    }
}

impl IntoKeyPath for &str {
    fn into_key_path(self) -> Result<KeyPath, StateError> {
        KeyPath::parse(self)
    }
}

impl IntoKeyPath for &String {
    fn into_key_path(self) -> Result<KeyPath, StateError> {
        KeyPath::parse(self)
    }
}

impl IntoKeyPath for &[&str] {
    fn into_key_path(self) -> Result<KeyPath, StateError> {
        KeyPath::from_segments(self.iter().copied())
    }
}

impl<const N: usize> IntoKeyPath for [&str; N] {
    fn into_key_path(self) -> Result<KeyPath, StateError> {
        KeyPath::from_segments(self)
    }
}
