//! Runtime-input refresh: regenerate every template invocation's inputs
//! against the current template shape.
//!
//! The local pass rebuilds the whole document bottom-up into a new ordered
//! map. At each template invocation the target entity is resolved and the
//! `templateInputs` field recomputed by the external
//! [`InputRefreshComputer`]: a `None` result removes the field entirely (the
//! spec no longer carries runtime-configurable fields), otherwise it is
//! replaced in place. All sibling fields are copied through unchanged.
//!
//! The local refresh is a pre-pass, not the final answer: the rebuilt
//! document and its template-substituted version both go to the sibling
//! reconciliation service's refresh endpoint, whose returned YAML is the
//! operation's result. The substitution pass carries the nesting depth
//! guard, so a template reference cycle aborts refresh as well.

use anyhow::Context;
use futures::future::BoxFuture;
use indexmap::IndexMap;

use crate::constants::{TEMPLATE_FIELD, TEMPLATE_INPUTS_FIELD};
use crate::core::TemplateRef;
use crate::expand::expand_templates;
use crate::external::{InputRefreshComputer, ReconciliationClient, TemplateStore};
use crate::node::Node;
use crate::resolver::{ResolutionCache, TemplateResolver};

/// Regenerates template inputs across a whole document.
pub struct InputRefreshEngine<'a> {
    store: &'a dyn TemplateStore,
    computer: &'a dyn InputRefreshComputer,
    reconciliation: &'a dyn ReconciliationClient,
}

impl<'a> InputRefreshEngine<'a> {
    /// Wire the engine to its collaborators.
    pub fn new(
        store: &'a dyn TemplateStore,
        computer: &'a dyn InputRefreshComputer,
        reconciliation: &'a dyn ReconciliationClient,
    ) -> Self {
        Self {
            store,
            computer,
            reconciliation,
        }
    }

    /// Refresh a YAML document, returning the reconciliation service's final
    /// refreshed YAML.
    pub async fn refresh(&self, yaml: &str) -> anyhow::Result<String> {
        let document = Node::from_yaml_str(yaml)?;
        let resolver = TemplateResolver::new(self.store);
        let mut cache = ResolutionCache::new();

        let refreshed = self.rebuild(&document, &resolver, &mut cache).await?;
        let refreshed_yaml = refreshed.to_yaml_string()?;
        tracing::debug!(templates = cache.len(), "local refresh pre-pass done");

        let resolved = expand_templates(&refreshed, 0, &resolver, &mut cache).await?;
        let resolved_yaml = resolved.to_yaml_string()?;
        self.reconciliation
            .refresh(&refreshed_yaml, &resolved_yaml)
            .await
            .context("reconciliation refresh call failed")
    }

    /// Rebuild a (sub)tree, recomputing inputs at each template invocation.
    fn rebuild<'b>(
        &'b self,
        node: &'b Node,
        resolver: &'b TemplateResolver<'b>,
        cache: &'b mut ResolutionCache,
    ) -> BoxFuture<'b, anyhow::Result<Node>> {
        Box::pin(async move {
            match node {
                Node::Value(_) => Ok(node.clone()),
                Node::Array(items) => {
                    if items.iter().all(Node::is_scalar) {
                        return Ok(node.clone());
                    }
                    let mut rebuilt = Vec::with_capacity(items.len());
                    for item in items {
                        rebuilt.push(self.rebuild(item, resolver, &mut *cache).await?);
                    }
                    Ok(Node::Array(rebuilt))
                }
                Node::Object(fields) => match TemplateRef::from_object(fields) {
                    Some(template) => {
                        let entity = resolver.resolve(&template, &mut *cache).await?;
                        let refreshed = self
                            .computer
                            .refresh(template.inputs.as_ref(), &entity.spec)
                            .context("input refresh computation failed")?;
                        Ok(rebuild_invocation(fields, refreshed))
                    }
                    None => {
                        let mut rebuilt = IndexMap::with_capacity(fields.len());
                        for (name, child) in fields {
                            rebuilt.insert(
                                name.clone(),
                                self.rebuild(child, resolver, &mut *cache).await?,
                            );
                        }
                        Ok(Node::Object(rebuilt))
                    }
                },
            }
        })
    }
}

/// Rebuild a template-invocation object with its inputs replaced or removed.
/// Every field other than `template.templateInputs` is copied unchanged.
fn rebuild_invocation(fields: &IndexMap<String, Node>, refreshed: Option<Node>) -> Node {
    let mut result = IndexMap::with_capacity(fields.len());
    for (name, child) in fields {
        if name != TEMPLATE_FIELD {
            result.insert(name.clone(), child.clone());
            continue;
        }
        let Some(template_fields) = child.as_object() else {
            result.insert(name.clone(), child.clone());
            continue;
        };
        let mut rebuilt = IndexMap::with_capacity(template_fields.len());
        for (t_name, t_child) in template_fields {
            if t_name == TEMPLATE_INPUTS_FIELD {
                if let Some(inputs) = &refreshed {
                    rebuilt.insert(t_name.clone(), inputs.clone());
                }
            } else {
                rebuilt.insert(t_name.clone(), t_child.clone());
            }
        }
        if let Some(inputs) = &refreshed {
            if !template_fields.contains_key(TEMPLATE_INPUTS_FIELD) {
                rebuilt.insert(TEMPLATE_INPUTS_FIELD.to_string(), inputs.clone());
            }
        }
        result.insert(name.clone(), Node::Object(rebuilt));
    }
    Node::Object(result)
}
