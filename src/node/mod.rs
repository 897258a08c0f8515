//! The generic document tree and its path-addressing primitives.
//!
//! A parsed YAML document is a tree of [`Node`]s: a closed tagged union of
//! ordered objects, arrays, and scalar leaves. Engines pattern match over
//! the union instead of reflecting over a dynamic tree. Documents and their
//! nodes are owned exclusively by the request that parses them; nothing here
//! is shared or mutated across requests.
//!
//! - [`Node`] - the tree itself
//! - [`Path`] / [`Segment`] - canonical per-node addresses
//! - [`PathIndex`] - a flattened path -> scalar index built once per document

mod index;
mod path;

pub use index::{PathEntry, PathIndex};
pub use path::{Path, Segment};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::TemplateError;

/// A node in a parsed document tree.
///
/// Objects preserve field order; arrays preserve element order; values hold
/// any scalar (string, number, bool, null) as an opaque JSON leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    /// Ordered field-name -> node mapping.
    Object(IndexMap<String, Node>),
    /// Ordered node sequence.
    Array(Vec<Node>),
    /// Scalar leaf.
    Value(serde_json::Value),
}

impl Node {
    /// Parse a YAML document into a tree.
    ///
    /// The root must be a non-empty mapping; anything else is rejected as a
    /// malformed document with no partial result.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, TemplateError> {
        if yaml.trim().is_empty() {
            return Err(TemplateError::MalformedDocument {
                reason: "document is empty".to_string(),
            });
        }
        let node: Self =
            serde_yaml::from_str(yaml).map_err(|err| TemplateError::MalformedDocument {
                reason: err.to_string(),
            })?;
        match &node {
            Self::Object(fields) if !fields.is_empty() => Ok(node),
            Self::Object(_) => Err(TemplateError::MalformedDocument {
                reason: "document is empty".to_string(),
            }),
            _ => Err(TemplateError::MalformedDocument {
                reason: "document root must be a mapping".to_string(),
            }),
        }
    }

    /// Serialize the tree back to YAML, preserving field order.
    pub fn to_yaml_string(&self) -> Result<String, TemplateError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// The object fields, if this is an object node.
    pub fn as_object(&self) -> Option<&IndexMap<String, Node>> {
        match self {
            Self::Object(fields) => Some(fields),
            _ => None,
        }
    }

    /// The elements, if this is an array node.
    pub fn as_array(&self) -> Option<&[Node]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// The scalar leaf, if this is a value node.
    pub fn as_scalar(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    /// The string content, if this is a string leaf.
    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar().and_then(serde_json::Value::as_str)
    }

    /// Look up a direct object field.
    pub fn get(&self, field: &str) -> Option<&Node> {
        self.as_object()?.get(field)
    }

    /// Whether this is a scalar leaf.
    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    /// Follow a path from this node through the live tree.
    pub fn at_path(&self, path: &Path) -> Option<&Node> {
        let mut current = self;
        for segment in path.segments() {
            current = match (current, segment) {
                (Self::Object(fields), Segment::Field(name)) => fields.get(name)?,
                (Self::Array(items), Segment::Index(i)) => items.get(*i)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Convenience constructor for a string leaf.
    pub fn string(value: &str) -> Self {
        Self::Value(serde_json::Value::String(value.to_string()))
    }
}
