//! Flattened path -> scalar index over a whole document.
//!
//! The reference extractor works over this index rather than re-walking the
//! tree: template-reference sites are found by a path-suffix pattern match,
//! and nested re-anchored references are read back by address. The index is
//! built once up front per document and never mutated.

use std::collections::HashMap;

use super::{Node, Path};

/// One scalar leaf and its canonical address.
#[derive(Debug, Clone)]
pub struct PathEntry {
    /// Address of the leaf.
    pub path: Path,
    /// The scalar value at that address.
    pub value: serde_json::Value,
}

/// An immutable flattened view of every scalar leaf in a document.
#[derive(Debug)]
pub struct PathIndex {
    entries: Vec<PathEntry>,
    by_dotted: HashMap<String, usize>,
}

impl PathIndex {
    /// Flatten a document into a path-addressed scalar index.
    pub fn build(root: &Node) -> Self {
        let mut index = Self {
            entries: Vec::new(),
            by_dotted: HashMap::new(),
        };
        index.collect(root, Path::root());
        index
    }

    fn collect(&mut self, node: &Node, path: Path) {
        match node {
            Node::Value(value) => {
                self.by_dotted.insert(path.dotted(), self.entries.len());
                self.entries.push(PathEntry {
                    path,
                    value: value.clone(),
                });
            }
            Node::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    self.collect(item, path.index(i));
                }
            }
            Node::Object(fields) => {
                for (name, child) in fields {
                    self.collect(child, path.child(name));
                }
            }
        }
    }

    /// All leaf entries in document order.
    pub fn entries(&self) -> impl Iterator<Item = &PathEntry> {
        self.entries.iter()
    }

    /// The scalar at an exact address, if one exists.
    pub fn scalar_at(&self, path: &Path) -> Option<&serde_json::Value> {
        let i = *self.by_dotted.get(&path.dotted())?;
        Some(&self.entries[i].value)
    }

    /// The string scalar at an exact address, if one exists.
    pub fn scalar_str_at(&self, path: &Path) -> Option<&str> {
        self.scalar_at(path)?.as_str()
    }
}
