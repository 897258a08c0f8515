//! Validation verdicts and the diagnostic error tree.

use serde::{Deserialize, Serialize};

use crate::constants::{IDENTIFIER_FIELD, NAME_FIELD};
use crate::core::TemplateSummary;
use crate::node::{Node, Path};

/// Identity of the document node an error is attached to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeInfo {
    /// The node's `identifier` field, when present.
    pub identifier: Option<String>,
    /// The node's `name` field, when present.
    pub name: Option<String>,
    /// Canonical address of the node in the validated document.
    pub path: Path,
}

impl NodeInfo {
    /// Read identity fields off a document node.
    pub fn from_node(node: &Node, path: &Path) -> Self {
        Self {
            identifier: node.get(IDENTIFIER_FIELD).and_then(Node::as_str).map(str::to_string),
            name: node.get(NAME_FIELD).and_then(Node::as_str).map(str::to_string),
            path: path.clone(),
        }
    }
}

/// One node of the diagnostic tree.
///
/// `Template` nodes point at a template invocation whose target (or whose
/// supplied inputs) failed validation; their children are the target's own
/// error nodes. `Unknown` nodes carry failures that could not be attributed
/// to a specific template, such as remote verdict entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ErrorNode {
    /// A template invocation failed validation.
    #[serde(rename_all = "camelCase")]
    Template {
        /// Which document node the failure is anchored at.
        node_info: NodeInfo,
        /// Which template the invocation resolved to.
        template: TemplateSummary,
        /// The target's own error nodes (empty for an inputs mismatch at
        /// this node itself).
        children: Vec<ErrorNode>,
    },
    /// A failure not attributable to a specific template invocation.
    #[serde(rename_all = "camelCase")]
    Unknown {
        /// Which document node the failure is anchored at.
        node_info: NodeInfo,
        /// Nested failures, if the reporter supplied any.
        children: Vec<ErrorNode>,
    },
}

/// Outcome of validating a document: a verdict plus the full error tree.
///
/// Non-fatal failures never abort the walk, so the tree reports every
/// problem in the document at once rather than just the first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// Conjunction of the local and remote verdicts.
    pub valid: bool,
    /// Ordered diagnostic tree; remote verdict nodes are appended at the
    /// top level after the locally produced ones.
    pub error_nodes: Vec<ErrorNode>,
}

impl ValidationResult {
    /// A passing verdict with an empty tree.
    pub fn passed() -> Self {
        Self {
            valid: true,
            error_nodes: Vec::new(),
        }
    }
}
