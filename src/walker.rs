//! Depth-first template-node discovery over a document tree.
//!
//! [`walk`] traverses object fields and array elements in order. When an
//! object carries the reserved template-invocation shape, the walker hands
//! the node to the visitor *instead of* recursing into it: recursion into a
//! resolved template body happens inside the visitor (by re-entering
//! [`walk`] with `depth + 1`), so each engine controls its own recursion
//! semantics. Ordinary object/array nesting never increments the depth
//! counter.
//!
//! A walk entered at [`MAX_NESTING_DEPTH`] fails fatally with
//! [`TemplateError::RecursionLimitExceeded`]. This is a cycle-safety valve,
//! not a precise cycle detector.

use futures::future::BoxFuture;

use crate::constants::MAX_NESTING_DEPTH;
use crate::core::{TemplateError, TemplateRef};
use crate::node::{Node, Path};

/// Callback invoked at every template node found by [`walk`].
#[async_trait::async_trait]
pub trait TemplateNodeVisitor: Send {
    /// Handle one template invocation.
    ///
    /// `node` is the enclosing object (the one carrying the `template`
    /// field), `path` its address in the walked document, and `depth` the
    /// current template-nesting depth to pass back (incremented) when
    /// recursing into the resolved body.
    async fn on_template_node(
        &mut self,
        path: &Path,
        node: &Node,
        template: &TemplateRef,
        depth: usize,
    ) -> anyhow::Result<()>;
}

/// Walk a (sub)tree depth-first, invoking the visitor at template nodes.
///
/// Arrays whose elements are all scalar are treated as leaves: scalar
/// arrays cannot contain template nodes, so walking them element-by-element
/// is pure overhead.
pub fn walk<'a, V>(
    node: &'a Node,
    path: Path,
    depth: usize,
    visitor: &'a mut V,
) -> BoxFuture<'a, anyhow::Result<()>>
where
    V: TemplateNodeVisitor,
{
    Box::pin(async move {
        if depth >= MAX_NESTING_DEPTH {
            return Err(TemplateError::RecursionLimitExceeded {
                limit: MAX_NESTING_DEPTH,
            }
            .into());
        }
        match node {
            Node::Value(_) => Ok(()),
            Node::Array(items) => {
                if items.iter().all(Node::is_scalar) {
                    return Ok(());
                }
                for (i, item) in items.iter().enumerate() {
                    walk(item, path.index(i), depth, &mut *visitor).await?;
                }
                Ok(())
            }
            Node::Object(fields) => {
                if let Some(template) = TemplateRef::from_object(fields) {
                    visitor.on_template_node(&path, node, &template, depth).await
                } else {
                    for (name, child) in fields {
                        walk(child, path.child(name), depth, &mut *visitor).await?;
                    }
                    Ok(())
                }
            }
        }
    })
}
