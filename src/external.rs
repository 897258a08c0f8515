//! Contracts for the external collaborators this core is built on.
//!
//! The core is a library invoked by request-handling code that owns
//! transport, auth, and storage; everything that leaves the process goes
//! through one of these seams. Outbound request/response collaborators are
//! `async` object-safe traits; the schema checker and input-refresh computer
//! are pure functions of their arguments and stay synchronous traits.
//!
//! No retries happen inside the core. Event-bus delivery is at-least-once
//! and delete-then-create is not transactional across the two messages, so
//! downstream consumers must tolerate replays.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::core::{DocumentContext, EntityReference, EntityType, Scope, TemplateEntity};
use crate::node::Node;
use crate::validation::ErrorNode;

/// Persistence seam for stored template entities.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Fetch the entity matching `(identifier, scope, version_label)`, or
    /// `None` when nothing matches.
    async fn get_entity(
        &self,
        identifier: &str,
        scope: Scope,
        version_label: &str,
    ) -> anyhow::Result<Option<TemplateEntity>>;

    /// The scope's currently designated default ("stable") version label for
    /// a template, or `None` when the template does not exist at all.
    async fn get_default_version(
        &self,
        identifier: &str,
        scope: Scope,
    ) -> anyhow::Result<Option<String>>;
}

/// Black-box structural compatibility check between supplied inputs and the
/// target template's parameter shape.
pub trait SchemaCompatibilityChecker: Send + Sync {
    /// Whether `inputs` is structurally compatible with `spec`, ignoring the
    /// given field paths.
    fn is_compatible(
        &self,
        inputs: &Node,
        spec: &Node,
        ignored_paths: &HashSet<String>,
    ) -> anyhow::Result<bool>;
}

/// Black-box recomputation of a template node's runtime inputs against the
/// current template shape.
pub trait InputRefreshComputer: Send + Sync {
    /// A refreshed inputs node, or `None` when the spec no longer carries
    /// any runtime-configurable fields (the caller then removes the field).
    fn refresh(&self, old_inputs: Option<&Node>, spec: &Node) -> anyhow::Result<Option<Node>>;
}

/// Remote verdict returned by the reconciliation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteValidation {
    /// The remote verdict; conjoined with the local one.
    pub valid: bool,
    /// Remote error nodes, appended at the top level of the local tree.
    pub error_nodes: Vec<ErrorNode>,
}

/// Sibling reconciliation service, called with the original document plus a
/// version with every template reference substituted by its resolved body.
#[async_trait]
pub trait ReconciliationClient: Send + Sync {
    /// Obtain the remote validation verdict.
    async fn validate(&self, yaml: &str, resolved_yaml: &str) -> anyhow::Result<RemoteValidation>;

    /// Obtain the final refreshed YAML; the local refresh is a pre-pass and
    /// this return value is the operation's answer.
    async fn refresh(&self, yaml: &str, resolved_yaml: &str) -> anyhow::Result<String>;
}

/// Read side of the persisted usage index.
#[async_trait]
pub trait UsageIndex: Send + Sync {
    /// The previously published outbound references of a stored template,
    /// with anchor paths relative to the template's own root.
    async fn get_outbound_references(
        &self,
        identifier: &str,
        scope: Scope,
        version_label: &str,
    ) -> anyhow::Result<Vec<EntityReference>>;
}

/// One usage-edge update message.
///
/// An empty `referred_entities` list with the delete flag set clears every
/// prior edge for the referrer. Non-empty messages carry the complete
/// replacement set for one referred-entity type, never a delta.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageEvent {
    /// Account the edges belong to.
    pub account_id: String,
    /// The referencing entity.
    pub referrer: EntityReference,
    /// Full replacement set of referred entities for `entity_type_key`.
    pub referred_entities: Vec<EntityReference>,
    /// Always set: consumers replace, never merge.
    pub delete_old_referred_by_records: bool,
    /// Partition/routing key; `None` on the delete-all message.
    pub entity_type_key: Option<EntityType>,
}

/// Fire-and-forget event-bus transport with at-least-once delivery.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Emit one usage-edge update message.
    async fn publish(&self, event: UsageEvent) -> anyhow::Result<()>;
}

/// Entity-type-specific extractor contributing a document's direct (non
/// template-nested) references.
#[async_trait]
pub trait DirectReferenceExtractor: Send + Sync {
    /// Direct references of `document`, keyed off `ctx.entity_type`.
    async fn extract(
        &self,
        ctx: &DocumentContext,
        document: &Node,
    ) -> anyhow::Result<Vec<EntityReference>>;
}

/// Collaborator-supplied per-element key for array elements that carry no
/// identifier of their own (such as a variable's name).
pub trait ArrayKeyProvider: Send + Sync {
    /// The unique key for an array element, or `None` when the element has
    /// no recognizable key.
    fn unique_key(&self, element: &Node) -> Option<String>;
}
