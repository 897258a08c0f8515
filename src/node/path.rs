//! Canonical node addresses (FQNs) within a parsed document.
//!
//! A [`Path`] is an immutable ordered list of segments, each a field name or
//! an array index, rendered as a dotted string (`stages.2.stage.name`).
//! Paths are computed per request and never reused across documents.

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One step of a [`Path`]: an object field name or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Object field name.
    Field(String),
    /// Array element index.
    Index(usize),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => write!(f, "{name}"),
            Self::Index(i) => write!(f, "{i}"),
        }
    }
}

/// The canonical dotted/indexed address of a node within a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    /// The document root (empty path).
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a dotted path string; purely numeric segments become indices.
    pub fn parse(dotted: &str) -> Self {
        if dotted.is_empty() {
            return Self::root();
        }
        let segments = dotted
            .split('.')
            .map(|part| match part.parse::<usize>() {
                Ok(i) => Segment::Index(i),
                Err(_) => Segment::Field(part.to_string()),
            })
            .collect();
        Self { segments }
    }

    /// Extend with a field name segment.
    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Field(name.to_string()));
        Self { segments }
    }

    /// Extend with an array index segment.
    pub fn index(&self, i: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Index(i));
        Self { segments }
    }

    /// Concatenate another path onto this one.
    pub fn join(&self, other: &Self) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Self { segments }
    }

    /// The segments in order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Whether this is the document root.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Whether the path ends in the given field-name suffix.
    pub fn ends_with_fields(&self, suffix: &[&str]) -> bool {
        if self.segments.len() < suffix.len() {
            return false;
        }
        self.segments[self.segments.len() - suffix.len()..]
            .iter()
            .zip(suffix)
            .all(|(segment, expected)| matches!(segment, Segment::Field(name) if name == expected))
    }

    /// A copy with the last `n` segments removed. Saturates at the root.
    pub fn strip_suffix(&self, n: usize) -> Self {
        let keep = self.segments.len().saturating_sub(n);
        Self {
            segments: self.segments[..keep].to_vec(),
        }
    }

    /// Split off a trailing field-name segment, if the path ends in one.
    pub fn split_last_field(&self) -> Option<(Self, &str)> {
        match self.segments.last()? {
            Segment::Field(name) => Some((self.strip_suffix(1), name.as_str())),
            Segment::Index(_) => None,
        }
    }

    /// Render the dotted string form.
    pub fn dotted(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.dotted())
    }
}

impl<'de> Deserialize<'de> for Path {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let dotted = String::deserialize(deserializer)?;
        if dotted.split('.').any(str::is_empty) && !dotted.is_empty() {
            return Err(D::Error::custom(format!("invalid path: '{dotted}'")));
        }
        Ok(Self::parse(&dotted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotted_round_trip() {
        let path = Path::root().child("stages").index(2).child("stage").child("name");
        assert_eq!(path.dotted(), "stages.2.stage.name");
        assert_eq!(Path::parse("stages.2.stage.name"), path);
    }

    #[test]
    fn suffix_matching_and_stripping() {
        let path = Path::parse("a.b.template.templateRef");
        assert!(path.ends_with_fields(&["template", "templateRef"]));
        assert!(!path.ends_with_fields(&["templateRef", "template"]));
        assert_eq!(path.strip_suffix(2).dotted(), "a.b");
    }

    #[test]
    fn suffix_match_ignores_index_segments() {
        let path = Path::parse("a.0.templateRef");
        assert!(path.ends_with_fields(&["templateRef"]));
        assert!(!Path::parse("a.templateRef.0").ends_with_fields(&["templateRef"]));
    }

    #[test]
    fn join_concatenates() {
        let anchor = Path::parse("stages.0.stage");
        let relative = Path::parse("spec.serviceRef");
        assert_eq!(anchor.join(&relative).dotted(), "stages.0.stage.spec.serviceRef");
    }

    #[test]
    fn root_is_empty_string() {
        assert_eq!(Path::root().dotted(), "");
        assert!(Path::parse("").is_root());
    }
}
