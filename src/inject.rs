//! Deterministic, collision-free node identifier injection.
//!
//! After template expansion has produced a flattened, merged document, nodes
//! that came out of a template body may lack the identifier field the target
//! syntax requires. [`inject_identifiers`] walks the resolved map in place
//! and ensures every entity-like node (one carrying a `name` or `type`
//! field) has one: `identifier` for V0 targets, `id` for V1. An
//! already-present identifier is never overwritten.
//!
//! Derived identifiers come from the node's `name` (falling back to `type`),
//! sanitized to identifier characters, with a numeric suffix appended only
//! when the base collides with an identifier already seen in this document.
//! The suffix state is a running max-suffix-per-base map scoped to a single
//! document, so repeated bases yield `build`, `build1`, `build2`, ...

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use crate::constants::{ID_FIELD, IDENTIFIER_FIELD, NAME_FIELD, TYPE_FIELD};
use crate::core::SyntaxVersion;
use crate::node::Node;

/// Running max-suffix-per-base state for one document.
#[derive(Debug, Default)]
pub struct SuffixCounters {
    last: HashMap<String, u64>,
}

impl SuffixCounters {
    /// Fresh counters for a new document.
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&mut self, base: &str) -> u64 {
        let counter = self.last.entry(base.to_string()).or_insert(0);
        *counter += 1;
        *counter
    }
}

/// Ensure every entity-like node in `map` carries the identifier field the
/// target syntax requires, mutating the map in place.
pub fn inject_identifiers(
    map: &mut IndexMap<String, Node>,
    syntax_version: SyntaxVersion,
    existing_ids: &mut HashSet<String>,
    counters: &mut SuffixCounters,
) {
    let target_field = match syntax_version {
        SyntaxVersion::V0 => {
            // Template bodies merged into V0 documents can leave a stray
            // generic `id` behind; V0's canonical field is `identifier`.
            map.shift_remove(ID_FIELD);
            IDENTIFIER_FIELD
        }
        SyntaxVersion::V1 => ID_FIELD,
    };

    match map.get(target_field).and_then(Node::as_str) {
        Some(present) => {
            existing_ids.insert(present.to_string());
        }
        None => {
            if let Some(base) = derive_base(map) {
                let assigned = pick_unique(&base, existing_ids, counters);
                existing_ids.insert(assigned.clone());
                map.insert(target_field.to_string(), Node::string(&assigned));
            }
        }
    }

    for (_, child) in map.iter_mut() {
        inject_into(child, syntax_version, existing_ids, counters);
    }
}

fn inject_into(
    node: &mut Node,
    syntax_version: SyntaxVersion,
    existing_ids: &mut HashSet<String>,
    counters: &mut SuffixCounters,
) {
    match node {
        Node::Object(fields) => inject_identifiers(fields, syntax_version, existing_ids, counters),
        Node::Array(items) => {
            for item in items {
                inject_into(item, syntax_version, existing_ids, counters);
            }
        }
        Node::Value(_) => {}
    }
}

/// Derive the identifier base from `name`, falling back to `type`; `None`
/// when the node is not entity-like.
fn derive_base(map: &IndexMap<String, Node>) -> Option<String> {
    let source = map
        .get(NAME_FIELD)
        .and_then(Node::as_str)
        .or_else(|| map.get(TYPE_FIELD).and_then(Node::as_str))?;
    let sanitized: String = source.chars().filter(char::is_ascii_alphanumeric).collect();
    if sanitized.is_empty() {
        Some("node".to_string())
    } else {
        Some(sanitized)
    }
}

fn pick_unique(
    base: &str,
    existing_ids: &HashSet<String>,
    counters: &mut SuffixCounters,
) -> String {
    if !existing_ids.contains(base) {
        return base.to_string();
    }
    loop {
        let candidate = format!("{base}{}", counters.next(base));
        if !existing_ids.contains(&candidate) {
            return candidate;
        }
    }
}
