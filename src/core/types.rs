//! Shared domain types: scopes, entity kinds, template references and
//! entities, and path-addressed entity references.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{
    STABLE_VERSION, TEMPLATE_FIELD, TEMPLATE_INPUTS_FIELD, TEMPLATE_REF_FIELD, VERSION_LABEL_FIELD,
};
use crate::node::{Node, Path};

/// Where an entity lives: directly under the account, under an organization,
/// or under a project.
///
/// Template identifiers carry their scope as a prefix: `account.deploy`
/// resolves in the account scope, `org.deploy` in the organization scope,
/// and a bare `deploy` in the project scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Account-level scope.
    Account,
    /// Organization-level scope.
    Org,
    /// Project-level scope (the default for unprefixed identifiers).
    Project,
}

impl Scope {
    /// Split a possibly scope-prefixed reference string into its scope and
    /// bare identifier.
    pub fn split_ref(raw: &str) -> (Self, &str) {
        if let Some(rest) = raw.strip_prefix("account.") {
            (Self::Account, rest)
        } else if let Some(rest) = raw.strip_prefix("org.") {
            (Self::Org, rest)
        } else {
            (Self::Project, raw)
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Account => write!(f, "account"),
            Self::Org => write!(f, "org"),
            Self::Project => write!(f, "project"),
        }
    }
}

/// Kinds of entities a document can be or refer to.
///
/// Covers both template child types (what a template expands into) and the
/// referred-entity types used to group usage edges. Serialized in the wire
/// format's SCREAMING_SNAKE_CASE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Pipeline,
    Stage,
    Step,
    StepGroup,
    CustomDeployment,
    ArtifactSource,
    Service,
    Environment,
    Infrastructure,
    Connector,
    Secret,
    Template,
}

impl EntityType {
    /// The per-element identifier sub-field name for multi-entity reference
    /// arrays of this type.
    pub fn identifier_field(self) -> &'static str {
        match self {
            Self::Service => "serviceRef",
            Self::Environment => "environmentRef",
            Self::Connector => "connectorRef",
            _ => "identifier",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pipeline => "PIPELINE",
            Self::Stage => "STAGE",
            Self::Step => "STEP",
            Self::StepGroup => "STEP_GROUP",
            Self::CustomDeployment => "CUSTOM_DEPLOYMENT",
            Self::ArtifactSource => "ARTIFACT_SOURCE",
            Self::Service => "SERVICE",
            Self::Environment => "ENVIRONMENT",
            Self::Infrastructure => "INFRASTRUCTURE",
            Self::Connector => "CONNECTOR",
            Self::Secret => "SECRET",
            Self::Template => "TEMPLATE",
        };
        write!(f, "{name}")
    }
}

/// Which document syntax generation a template targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyntaxVersion {
    /// Legacy syntax: canonical identifier field is `identifier`.
    V0,
    /// Current syntax: canonical identifier field is `id`.
    V1,
}

/// A parsed template invocation extracted from a document node.
///
/// Recognized by the reserved shape
/// `template: { templateRef, versionLabel?, templateInputs? }` on an object
/// node. `version_label` is `None` when the invocation asks for the stable
/// version, either by omitting the label or by naming the sentinel literally.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateRef {
    /// Bare template identifier (scope prefix already stripped).
    pub identifier: String,
    /// Scope parsed from the reference prefix.
    pub scope: Scope,
    /// Explicit version label; `None` selects the stable version.
    pub version_label: Option<String>,
    /// Caller-supplied runtime inputs, if any.
    pub inputs: Option<Node>,
}

impl TemplateRef {
    /// Parse a template invocation from an object node's fields.
    ///
    /// Returns `None` when the object does not carry the reserved template
    /// shape (no `template` field, or no scalar `templateRef` inside it).
    pub fn from_object(fields: &indexmap::IndexMap<String, Node>) -> Option<Self> {
        let Node::Object(template) = fields.get(TEMPLATE_FIELD)? else {
            return None;
        };
        let raw = template.get(TEMPLATE_REF_FIELD)?.as_str()?;
        let (scope, identifier) = Scope::split_ref(raw);
        let version_label = template
            .get(VERSION_LABEL_FIELD)
            .and_then(Node::as_str)
            .filter(|label| *label != STABLE_VERSION)
            .map(str::to_string);
        Some(Self {
            identifier: identifier.to_string(),
            scope,
            version_label,
            inputs: template.get(TEMPLATE_INPUTS_FIELD).cloned(),
        })
    }
}

/// An immutable stored template, as fetched from the template store.
///
/// Instances are owned by the per-request [`ResolutionCache`]
/// (crate::resolver::ResolutionCache) and never mutated or shared across
/// requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateEntity {
    /// Bare template identifier.
    pub identifier: String,
    /// Concrete version label of this entity.
    pub version_label: String,
    /// Scope the entity lives in.
    pub scope: Scope,
    /// What the template expands into.
    pub child_type: EntityType,
    /// Document syntax generation the template targets.
    pub syntax_version: SyntaxVersion,
    /// The raw stored YAML of the template.
    pub raw_yaml: String,
    /// The template's parsed parameter/body subtree.
    pub spec: Node,
}

/// A compact description of a template entity, attached to diagnostic error
/// nodes so callers can render which template a failure points at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSummary {
    /// Template identifier.
    pub identifier: String,
    /// Concrete version the failure was observed against.
    pub version_label: String,
    /// Scope of the template.
    pub scope: Scope,
    /// What the template expands into.
    pub child_type: EntityType,
}

impl From<&TemplateEntity> for TemplateSummary {
    fn from(entity: &TemplateEntity) -> Self {
        Self {
            identifier: entity.identifier.clone(),
            version_label: entity.version_label.clone(),
            scope: entity.scope,
            child_type: entity.child_type,
        }
    }
}

/// Coordinates and kind of the document an operation runs against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentContext {
    /// Owning account identifier.
    pub account_id: String,
    /// Owning organization identifier, absent for account-level documents.
    pub org_id: Option<String>,
    /// Owning project identifier, absent above project level.
    pub project_id: Option<String>,
    /// What kind of entity the document is.
    pub entity_type: EntityType,
}

/// Fully qualified identifier of a referenced entity.
///
/// `scope` is `None` when resolution was deferred because the reference
/// value is a runtime expression, which only yields a concrete identifier
/// at execution time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifierRef {
    /// Account the reference resolves under.
    pub account_id: String,
    /// Organization, when the scope reaches it.
    pub org_id: Option<String>,
    /// Project, when the scope reaches it.
    pub project_id: Option<String>,
    /// Bare entity identifier (scope prefix stripped), or the raw expression
    /// text for deferred references.
    pub identifier: String,
    /// Resolved scope, or `None` when deferred.
    pub scope: Option<Scope>,
}

impl IdentifierRef {
    /// Build a reference to `identifier` at `scope`, anchored in the given
    /// document's coordinates. Coordinates below the scope are dropped.
    pub fn within(ctx: &DocumentContext, scope: Scope, identifier: &str) -> Self {
        let (org_id, project_id) = match scope {
            Scope::Account => (None, None),
            Scope::Org => (ctx.org_id.clone(), None),
            Scope::Project => (ctx.org_id.clone(), ctx.project_id.clone()),
        };
        Self {
            account_id: ctx.account_id.clone(),
            org_id,
            project_id,
            identifier: identifier.to_string(),
            scope: Some(scope),
        }
    }

    /// Build a deferred reference whose identifier is a runtime expression.
    pub fn deferred(ctx: &DocumentContext, expression: &str) -> Self {
        Self {
            account_id: ctx.account_id.clone(),
            org_id: ctx.org_id.clone(),
            project_id: ctx.project_id.clone(),
            identifier: expression.to_string(),
            scope: None,
        }
    }
}

/// A path-addressed reference from a document to an external entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityReference {
    /// Kind of the referred entity.
    pub entity_type: EntityType,
    /// Who is referred to.
    pub identifier_ref: IdentifierRef,
    /// Where in the referring document the reference is anchored.
    pub anchor_path: Path,
    /// The literal value or expression found at the reference site.
    pub value: String,
    /// Whether `value` is a runtime expression (scope resolution deferred).
    pub is_expression: bool,
}
