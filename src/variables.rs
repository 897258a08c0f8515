//! Variable indexing over a UUID-injected document.
//!
//! Expression and autocomplete support needs to map the UUID injected at
//! every leaf back to the leaf's canonical address and declared name.
//! [`index_variables`] walks a document in which each leaf value has been
//! replaced by a UUID and records `uuid -> {fqn, name}` for every leaf
//! field that is not itself bookkeeping (`identifier`, `uuid`, `type`).
//!
//! Array elements are addressed by identity, not position: an element with
//! its own `identifier` is walked as an object with the path extended by
//! that identifier; an element without one but with a collaborator-supplied
//! unique key (such as a variable's name) contributes only its `value`
//! sub-field, anchored at the parent path plus that key.

use std::collections::HashMap;

use uuid::Uuid;

use crate::constants::{IDENTIFIER_FIELD, TYPE_FIELD, UUID_FIELD, VALUE_FIELD};
use crate::external::ArrayKeyProvider;
use crate::node::{Node, Path};

/// Where a variable lives and what it is called.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableEntry {
    /// Canonical dotted address of the leaf.
    pub fqn: String,
    /// Declared field or key name.
    pub name: String,
}

/// Build the UUID -> address map for a UUID-injected document.
pub fn index_variables(
    document: &Node,
    array_keys: &dyn ArrayKeyProvider,
) -> HashMap<Uuid, VariableEntry> {
    let mut entries = HashMap::new();
    collect(document, &Path::root(), array_keys, &mut entries);
    entries
}

fn collect(
    node: &Node,
    path: &Path,
    array_keys: &dyn ArrayKeyProvider,
    entries: &mut HashMap<Uuid, VariableEntry>,
) {
    let Some(fields) = node.as_object() else {
        return;
    };
    for (name, child) in fields {
        match child {
            Node::Value(_) => {
                if name == IDENTIFIER_FIELD || name == UUID_FIELD || name == TYPE_FIELD {
                    continue;
                }
                record(child, path.child(name), name, entries);
            }
            Node::Object(_) => collect(child, &path.child(name), array_keys, entries),
            Node::Array(items) => {
                let array_path = path.child(name);
                for element in items {
                    if let Some(identifier) = element.get(IDENTIFIER_FIELD).and_then(Node::as_str) {
                        collect(element, &array_path.child(identifier), array_keys, entries);
                    } else if let Some(key) = array_keys.unique_key(element) {
                        if let Some(value) = element.get(VALUE_FIELD) {
                            record(value, array_path.child(&key), &key, entries);
                        }
                    }
                }
            }
        }
    }
}

fn record(leaf: &Node, fqn: Path, name: &str, entries: &mut HashMap<Uuid, VariableEntry>) {
    let Some(uuid) = leaf.as_str().and_then(|raw| Uuid::parse_str(raw).ok()) else {
        tracing::debug!(path = %fqn, "leaf without an injected uuid, skipping");
        return;
    };
    entries.insert(
        uuid,
        VariableEntry {
            fqn: fqn.dotted(),
            name: name.to_string(),
        },
    );
}
