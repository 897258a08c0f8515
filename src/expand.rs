//! Template substitution: rebuild a document with every template invocation
//! replaced by its resolved body.
//!
//! The reconciliation service is called with the original document plus a
//! version in which each template node has been textually substituted by the
//! referenced template's spec, with the caller's runtime inputs overlaid.
//! Substitution recurses into resolved bodies (they may themselves contain
//! template nodes), so this pass carries the nesting depth guard for both
//! the validate and refresh operations.

use futures::future::BoxFuture;
use indexmap::IndexMap;

use crate::constants::{MAX_NESTING_DEPTH, TEMPLATE_FIELD};
use crate::core::{TemplateError, TemplateRef};
use crate::node::Node;
use crate::resolver::{ResolutionCache, TemplateResolver};

/// Rebuild `node` with every template invocation replaced by its resolved,
/// inputs-overlaid, recursively substituted body.
pub fn expand_templates<'a>(
    node: &'a Node,
    depth: usize,
    resolver: &'a TemplateResolver<'a>,
    cache: &'a mut ResolutionCache,
) -> BoxFuture<'a, anyhow::Result<Node>> {
    Box::pin(async move {
        if depth >= MAX_NESTING_DEPTH {
            return Err(TemplateError::RecursionLimitExceeded {
                limit: MAX_NESTING_DEPTH,
            }
            .into());
        }
        match node {
            Node::Value(_) => Ok(node.clone()),
            Node::Array(items) => {
                if items.iter().all(Node::is_scalar) {
                    return Ok(node.clone());
                }
                let mut expanded = Vec::with_capacity(items.len());
                for item in items {
                    expanded.push(expand_templates(item, depth, resolver, &mut *cache).await?);
                }
                Ok(Node::Array(expanded))
            }
            Node::Object(fields) => match TemplateRef::from_object(fields) {
                Some(template) => {
                    let entity = resolver.resolve(&template, &mut *cache).await?;
                    let merged = match &template.inputs {
                        Some(inputs) => overlay(&entity.spec, inputs),
                        None => entity.spec.clone(),
                    };
                    let body = expand_templates(&merged, depth + 1, resolver, &mut *cache).await?;
                    Ok(splice_body(fields, body))
                }
                None => {
                    let mut expanded = IndexMap::with_capacity(fields.len());
                    for (name, child) in fields {
                        expanded.insert(
                            name.clone(),
                            expand_templates(child, depth, resolver, &mut *cache).await?,
                        );
                    }
                    Ok(Node::Object(expanded))
                }
            },
        }
    })
}

/// Overlay runtime inputs onto a template spec: objects merge field-wise
/// with the inputs winning, everything else is replaced by the input value.
fn overlay(base: &Node, over: &Node) -> Node {
    match (base, over) {
        (Node::Object(base_fields), Node::Object(over_fields)) => {
            let mut merged = base_fields.clone();
            for (name, value) in over_fields {
                let combined = match base_fields.get(name) {
                    Some(existing) => overlay(existing, value),
                    None => value.clone(),
                };
                merged.insert(name.clone(), combined);
            }
            Node::Object(merged)
        }
        _ => over.clone(),
    }
}

/// Replace the `template` field of an invocation object with the fields of
/// the substituted body, keeping sibling fields (name, identifier, ...) in
/// their original positions.
fn splice_body(fields: &IndexMap<String, Node>, body: Node) -> Node {
    let mut result = IndexMap::with_capacity(fields.len());
    for (name, child) in fields {
        if name == TEMPLATE_FIELD {
            match &body {
                Node::Object(body_fields) => {
                    for (body_name, body_child) in body_fields {
                        result.insert(body_name.clone(), body_child.clone());
                    }
                }
                other => {
                    result.insert(TEMPLATE_FIELD.to_string(), other.clone());
                }
            }
        } else {
            result.insert(name.clone(), child.clone());
        }
    }
    Node::Object(result)
}
