//! Transitive entity-reference extraction for a document.
//!
//! Two independent passes are combined:
//!
//! 1. **Direct references** come from the entity-type-specific
//!    [`DirectReferenceExtractor`] collaborator, keyed off the document's
//!    entity type.
//! 2. **Template-pulled references** come from a structural pattern match
//!    over a flattened path index of the whole document (built once up
//!    front, not a walk): every scalar whose path ends in
//!    `template.templateRef` is a template invocation site. For each site
//!    the enclosing anchor path is derived by stripping the trailing
//!    `template.templateRef` segments, the target entity is resolved
//!    (default version when no `versionLabel` sibling exists), a
//!    `TEMPLATE`-typed reference is emitted at the anchor, and the target's
//!    *previously recorded* outbound references are fetched from the usage
//!    index - not recomputed from its YAML. Each of those whose value was a
//!    runtime-input placeholder is the referencing document's
//!    responsibility: it is re-anchored by concatenating the current anchor
//!    with the stored template-relative path, and the concrete value is
//!    read back out of this document.
//!
//! Values matching the runtime-expression pattern are tagged
//! `is_expression` and their scope resolution is deferred.

use std::sync::LazyLock;

use anyhow::Context;
use regex::Regex;

use crate::constants::{
    RUNTIME_INPUT_MARKER, STABLE_VERSION, TEMPLATE_FIELD, TEMPLATE_REF_FIELD, VERSION_LABEL_FIELD,
};
use crate::core::{
    DocumentContext, EntityReference, EntityType, IdentifierRef, Scope, TemplateRef,
};
use crate::external::{DirectReferenceExtractor, TemplateStore, UsageIndex};
use crate::node::{Node, Path, PathIndex};
use crate::resolver::{ResolutionCache, TemplateResolver};

static EXPRESSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<\+[^>]+>").expect("expression pattern is valid"));

/// Whether a literal value is a runtime expression.
pub fn is_expression(value: &str) -> bool {
    EXPRESSION_PATTERN.is_match(value)
}

/// Computes the transitive set of externally referenced entities for a
/// document.
pub struct ReferenceExtractor<'a> {
    store: &'a dyn TemplateStore,
    usage_index: &'a dyn UsageIndex,
    direct: &'a dyn DirectReferenceExtractor,
}

impl<'a> ReferenceExtractor<'a> {
    /// Wire the extractor to its collaborators.
    pub fn new(
        store: &'a dyn TemplateStore,
        usage_index: &'a dyn UsageIndex,
        direct: &'a dyn DirectReferenceExtractor,
    ) -> Self {
        Self {
            store,
            usage_index,
            direct,
        }
    }

    /// Extract every external entity reference of `yaml`, direct and
    /// template-pulled, in document order.
    pub async fn extract_references(
        &self,
        ctx: &DocumentContext,
        yaml: &str,
    ) -> anyhow::Result<Vec<EntityReference>> {
        let document = Node::from_yaml_str(yaml)?;
        let mut references = self
            .direct
            .extract(ctx, &document)
            .await
            .context("direct reference extraction failed")?;

        let index = PathIndex::build(&document);
        let resolver = TemplateResolver::new(self.store);
        let mut cache = ResolutionCache::new();

        let sites: Vec<(Path, String)> = index
            .entries()
            .filter(|entry| entry.path.ends_with_fields(&[TEMPLATE_FIELD, TEMPLATE_REF_FIELD]))
            .filter_map(|entry| {
                Some((entry.path.clone(), entry.value.as_str()?.to_string()))
            })
            .collect();

        for (site, raw) in sites {
            if is_expression(&raw) {
                tracing::debug!(path = %site, value = %raw, "skipping expression-valued templateRef");
                continue;
            }
            let anchor = site.strip_suffix(2);
            self.collect_template_site(ctx, &document, &index, &anchor, &raw, &resolver, &mut cache, &mut references)
                .await?;
        }
        Ok(references)
    }

    #[allow(clippy::too_many_arguments)]
    async fn collect_template_site(
        &self,
        ctx: &DocumentContext,
        document: &Node,
        index: &PathIndex,
        anchor: &Path,
        raw: &str,
        resolver: &TemplateResolver<'_>,
        cache: &mut ResolutionCache,
        references: &mut Vec<EntityReference>,
    ) -> anyhow::Result<()> {
        let (scope, identifier) = Scope::split_ref(raw);
        let version_path = anchor.child(TEMPLATE_FIELD).child(VERSION_LABEL_FIELD);
        let version_label = index
            .scalar_str_at(&version_path)
            .filter(|label| *label != STABLE_VERSION)
            .map(str::to_string);

        let reference = TemplateRef {
            identifier: identifier.to_string(),
            scope,
            version_label,
            inputs: None,
        };
        let entity = resolver.resolve(&reference, cache).await?;

        references.push(EntityReference {
            entity_type: EntityType::Template,
            identifier_ref: IdentifierRef::within(ctx, scope, &entity.identifier),
            anchor_path: anchor.clone(),
            value: raw.to_string(),
            is_expression: false,
        });

        let outbound = self
            .usage_index
            .get_outbound_references(&entity.identifier, entity.scope, &entity.version_label)
            .await
            .context("usage index outbound-reference lookup failed")?;
        tracing::debug!(
            identifier = %entity.identifier,
            count = outbound.len(),
            "re-anchoring nested references"
        );

        for nested in outbound {
            // Only references the template left as runtime inputs become
            // this document's responsibility; the rest stay the template's.
            if nested.value != RUNTIME_INPUT_MARKER {
                continue;
            }
            let combined = anchor.join(&nested.anchor_path);
            if let Some(value) = index.scalar_str_at(&combined) {
                references.push(reanchored(ctx, nested.entity_type, combined.clone(), value));
                continue;
            }
            match document.at_path(&combined) {
                Some(Node::Array(items)) => {
                    let field = nested.entity_type.identifier_field();
                    for (i, item) in items.iter().enumerate() {
                        if let Some(value) = item.get(field).and_then(Node::as_str) {
                            references.push(reanchored(
                                ctx,
                                nested.entity_type,
                                combined.index(i),
                                value,
                            ));
                        }
                    }
                }
                _ => {
                    tracing::debug!(
                        path = %combined,
                        "nested reference site not present in referencing document"
                    );
                }
            }
        }
        Ok(())
    }
}

/// Build a re-anchored reference from a concrete value found in the
/// referencing document.
fn reanchored(
    ctx: &DocumentContext,
    entity_type: EntityType,
    anchor_path: Path,
    value: &str,
) -> EntityReference {
    if is_expression(value) {
        return EntityReference {
            entity_type,
            identifier_ref: IdentifierRef::deferred(ctx, value),
            anchor_path,
            value: value.to_string(),
            is_expression: true,
        };
    }
    let (scope, identifier) = Scope::split_ref(value);
    EntityReference {
        entity_type,
        identifier_ref: IdentifierRef::within(ctx, scope, identifier),
        anchor_path,
        value: value.to_string(),
        is_expression: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expression_pattern_matches_runtime_syntax() {
        assert!(is_expression("<+input>"));
        assert!(is_expression("<+pipeline.variables.svc>"));
        assert!(is_expression("prefix-<+env.name>-suffix"));
        assert!(!is_expression("plainService"));
        assert!(!is_expression("account.myTemplate"));
    }

    #[test]
    fn reanchored_defers_scope_for_expressions() {
        let ctx = DocumentContext {
            account_id: "acct".to_string(),
            org_id: Some("o".to_string()),
            project_id: Some("p".to_string()),
            entity_type: EntityType::Pipeline,
        };
        let deferred = reanchored(
            &ctx,
            EntityType::Service,
            Path::parse("a.b.serviceRef"),
            "<+pipeline.variables.svc>",
        );
        assert!(deferred.is_expression);
        assert_eq!(deferred.identifier_ref.scope, None);

        let concrete = reanchored(&ctx, EntityType::Service, Path::parse("a.b.serviceRef"), "org.svc");
        assert!(!concrete.is_expression);
        assert_eq!(concrete.identifier_ref.scope, Some(Scope::Org));
        assert_eq!(concrete.identifier_ref.identifier, "svc");
    }
}
