//! Recursive runtime-input validation with a diagnostic error tree.
//!
//! [`InputValidationEngine::validate`] walks a document, and for every
//! template invocation found:
//!
//! 1. resolves the target entity (depth-guarded),
//! 2. recursively validates the target's own body - its spec may itself
//!    contain template invocations,
//! 3. if the target failed, marks this node invalid and attaches the
//!    target's error nodes as children *without* checking this node's own
//!    inputs (the target must be fixed first, a second report would be
//!    noise),
//! 4. otherwise checks the supplied `templateInputs` against the target
//!    spec through the external schema-compatibility checker. A mismatch
//!    clears the verdict and appends a childless error node for the
//!    invocation.
//!
//! After the local walk, the remote verdict is obtained from the sibling
//! reconciliation service over the original and template-substituted
//! documents; the final verdict is the conjunction of both, and remote
//! error nodes are appended at the top level of the tree.

mod result;

pub use result::{ErrorNode, NodeInfo, ValidationResult};

use std::collections::HashSet;
use std::sync::LazyLock;

use anyhow::Context;
use futures::future::BoxFuture;

use crate::constants::COMPAT_IGNORED_PATHS;
use crate::core::{TemplateRef, TemplateSummary};
use crate::expand::expand_templates;
use crate::external::{ReconciliationClient, SchemaCompatibilityChecker, TemplateStore};
use crate::node::{Node, Path};
use crate::resolver::{ResolutionCache, TemplateResolver};
use crate::walker::{TemplateNodeVisitor, walk};

static IGNORED_PATHS: LazyLock<HashSet<String>> = LazyLock::new(|| {
    COMPAT_IGNORED_PATHS.iter().map(|p| (*p).to_string()).collect()
});

/// Validates runtime inputs of every template invocation in a document.
pub struct InputValidationEngine<'a> {
    store: &'a dyn TemplateStore,
    checker: &'a dyn SchemaCompatibilityChecker,
    reconciliation: &'a dyn ReconciliationClient,
}

impl<'a> InputValidationEngine<'a> {
    /// Wire the engine to its collaborators.
    pub fn new(
        store: &'a dyn TemplateStore,
        checker: &'a dyn SchemaCompatibilityChecker,
        reconciliation: &'a dyn ReconciliationClient,
    ) -> Self {
        Self {
            store,
            checker,
            reconciliation,
        }
    }

    /// Validate a YAML document, producing the combined local and remote
    /// verdict with the full diagnostic tree.
    ///
    /// Fatal failures (malformed input, runaway nesting, missing templates,
    /// collaborator errors) abort with no partial result. Schema
    /// incompatibilities complete the walk and report `valid = false`.
    pub async fn validate(&self, yaml: &str) -> anyhow::Result<ValidationResult> {
        let document = Node::from_yaml_str(yaml)?;
        let resolver = TemplateResolver::new(self.store);
        let mut cache = ResolutionCache::new();

        let (local_valid, mut error_nodes) =
            self.validate_tree(&document, 0, &resolver, &mut cache).await?;
        tracing::debug!(valid = local_valid, errors = error_nodes.len(), "local validation done");

        let resolved = expand_templates(&document, 0, &resolver, &mut cache).await?;
        let resolved_yaml = resolved.to_yaml_string()?;
        let remote = self
            .reconciliation
            .validate(yaml, &resolved_yaml)
            .await
            .context("reconciliation validate call failed")?;
        error_nodes.extend(remote.error_nodes);

        Ok(ValidationResult {
            valid: local_valid && remote.valid,
            error_nodes,
        })
    }

    /// Validate one (sub)tree, returning its verdict and error nodes.
    fn validate_tree<'b>(
        &'b self,
        node: &'b Node,
        depth: usize,
        resolver: &'b TemplateResolver<'b>,
        cache: &'b mut ResolutionCache,
    ) -> BoxFuture<'b, anyhow::Result<(bool, Vec<ErrorNode>)>> {
        Box::pin(async move {
            let mut visitor = ValidationVisitor {
                engine: self,
                resolver,
                cache,
                valid: true,
                errors: Vec::new(),
            };
            walk(node, Path::root(), depth, &mut visitor).await?;
            Ok((visitor.valid, visitor.errors))
        })
    }
}

struct ValidationVisitor<'b> {
    engine: &'b InputValidationEngine<'b>,
    resolver: &'b TemplateResolver<'b>,
    cache: &'b mut ResolutionCache,
    valid: bool,
    errors: Vec<ErrorNode>,
}

#[async_trait::async_trait]
impl TemplateNodeVisitor for ValidationVisitor<'_> {
    async fn on_template_node(
        &mut self,
        path: &Path,
        node: &Node,
        template: &TemplateRef,
        depth: usize,
    ) -> anyhow::Result<()> {
        let entity = self.resolver.resolve(template, &mut *self.cache).await?;

        let (child_valid, child_errors) = self
            .engine
            .validate_tree(&entity.spec, depth + 1, self.resolver, &mut *self.cache)
            .await?;
        if !child_valid {
            self.valid = false;
            self.errors.push(ErrorNode::Template {
                node_info: NodeInfo::from_node(node, path),
                template: TemplateSummary::from(entity.as_ref()),
                children: child_errors,
            });
            // The target itself is broken; checking this node's inputs
            // against it would only produce a duplicate report.
            return Ok(());
        }

        let compatible = match &template.inputs {
            Some(inputs) => self
                .engine
                .checker
                .is_compatible(inputs, &entity.spec, &IGNORED_PATHS)
                .context("schema compatibility check failed")?,
            None => true,
        };
        if !compatible {
            tracing::debug!(
                path = %path,
                identifier = %template.identifier,
                "template inputs incompatible with target spec"
            );
            self.valid = false;
            self.errors.push(ErrorNode::Template {
                node_info: NodeInfo::from_node(node, path),
                template: TemplateSummary::from(entity.as_ref()),
                children: Vec::new(),
            });
        }
        Ok(())
    }
}
