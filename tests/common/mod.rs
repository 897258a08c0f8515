//! In-memory fakes of every external collaborator, shared by the
//! integration suites.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use template_core::external::{
    DirectReferenceExtractor, EventBus, InputRefreshComputer, ReconciliationClient,
    RemoteValidation, SchemaCompatibilityChecker, TemplateStore, UsageEvent, UsageIndex,
};
use template_core::validation::ErrorNode;
use template_core::{
    DocumentContext, EntityReference, EntityType, Node, Scope, SyntaxVersion, TemplateEntity,
};

/// Route engine logs through `RUST_LOG` when a test needs them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A project-scoped document context used across the suites.
pub fn ctx() -> DocumentContext {
    DocumentContext {
        account_id: "acct".to_string(),
        org_id: Some("myOrg".to_string()),
        project_id: Some("myProj".to_string()),
        entity_type: EntityType::Pipeline,
    }
}

/// Build a project-scoped stage template from a spec YAML snippet.
pub fn template(identifier: &str, version_label: &str, spec_yaml: &str) -> TemplateEntity {
    TemplateEntity {
        identifier: identifier.to_string(),
        version_label: version_label.to_string(),
        scope: Scope::Project,
        child_type: EntityType::Stage,
        syntax_version: SyntaxVersion::V0,
        raw_yaml: spec_yaml.to_string(),
        spec: Node::from_yaml_str(spec_yaml).expect("fixture spec parses"),
    }
}

/// In-memory template store with configurable default versions.
#[derive(Default)]
pub struct InMemoryStore {
    templates: HashMap<(String, Scope, String), TemplateEntity>,
    defaults: HashMap<(String, Scope), String>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity; the first registered version of an identifier
    /// becomes its default unless overridden.
    pub fn insert(&mut self, entity: TemplateEntity) {
        let key = (entity.identifier.clone(), entity.scope);
        self.defaults.entry(key).or_insert_with(|| entity.version_label.clone());
        self.templates.insert(
            (entity.identifier.clone(), entity.scope, entity.version_label.clone()),
            entity,
        );
    }

    pub fn set_default(&mut self, identifier: &str, scope: Scope, version_label: &str) {
        self.defaults.insert((identifier.to_string(), scope), version_label.to_string());
    }

    /// A store holding a reference chain `t0 -> t1 -> ... -> t{len-1}`,
    /// where every template but the last invokes the next one.
    pub fn chain(len: usize) -> Self {
        let mut store = Self::new();
        for i in 0..len {
            let spec = if i + 1 < len {
                format!(
                    "stage:\n  template:\n    templateRef: t{}\n    versionLabel: v1\n",
                    i + 1
                )
            } else {
                "stage:\n  spec:\n    command: echo done\n".to_string()
            };
            store.insert(template(&format!("t{i}"), "v1", &spec));
        }
        store
    }
}

#[async_trait]
impl TemplateStore for InMemoryStore {
    async fn get_entity(
        &self,
        identifier: &str,
        scope: Scope,
        version_label: &str,
    ) -> anyhow::Result<Option<TemplateEntity>> {
        Ok(self
            .templates
            .get(&(identifier.to_string(), scope, version_label.to_string()))
            .cloned())
    }

    async fn get_default_version(
        &self,
        identifier: &str,
        scope: Scope,
    ) -> anyhow::Result<Option<String>> {
        Ok(self.defaults.get(&(identifier.to_string(), scope)).cloned())
    }
}

/// Checker that fails whenever the supplied inputs contain a marker string.
pub struct MarkerChecker {
    pub fail_when_inputs_contain: Option<String>,
}

impl MarkerChecker {
    pub fn always_compatible() -> Self {
        Self { fail_when_inputs_contain: None }
    }

    pub fn failing_on(marker: &str) -> Self {
        Self { fail_when_inputs_contain: Some(marker.to_string()) }
    }
}

impl SchemaCompatibilityChecker for MarkerChecker {
    fn is_compatible(
        &self,
        inputs: &Node,
        _spec: &Node,
        _ignored_paths: &HashSet<String>,
    ) -> anyhow::Result<bool> {
        match &self.fail_when_inputs_contain {
            Some(marker) => Ok(!inputs.to_yaml_string()?.contains(marker)),
            None => Ok(true),
        }
    }
}

/// Reconciliation client that echoes the local document back on refresh and
/// returns a configured verdict on validate.
pub struct EchoReconciliation {
    pub valid: bool,
    pub error_nodes: Vec<ErrorNode>,
}

impl EchoReconciliation {
    pub fn passing() -> Self {
        Self { valid: true, error_nodes: Vec::new() }
    }
}

#[async_trait]
impl ReconciliationClient for EchoReconciliation {
    async fn validate(&self, _yaml: &str, _resolved_yaml: &str) -> anyhow::Result<RemoteValidation> {
        Ok(RemoteValidation {
            valid: self.valid,
            error_nodes: self.error_nodes.clone(),
        })
    }

    async fn refresh(&self, yaml: &str, _resolved_yaml: &str) -> anyhow::Result<String> {
        Ok(yaml.to_string())
    }
}

/// Computer that overlays nothing: echoes the old inputs, drops them when
/// the spec carries a `noInputs` marker, or replaces them with a fixed node
/// when the spec carries a `rewrite` marker.
pub struct FixtureComputer;

impl InputRefreshComputer for FixtureComputer {
    fn refresh(&self, old_inputs: Option<&Node>, spec: &Node) -> anyhow::Result<Option<Node>> {
        let spec_yaml = spec.to_yaml_string()?;
        if spec_yaml.contains("noInputs") {
            return Ok(None);
        }
        if spec_yaml.contains("rewrite") {
            return Ok(Some(Node::from_yaml_str("spec:\n  image: refreshed\n")?));
        }
        Ok(old_inputs.cloned())
    }
}

/// Usage index serving pre-recorded outbound references per identifier.
#[derive(Default)]
pub struct StaticUsageIndex {
    outbound: HashMap<String, Vec<EntityReference>>,
}

impl StaticUsageIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, identifier: &str, references: Vec<EntityReference>) {
        self.outbound.insert(identifier.to_string(), references);
    }
}

#[async_trait]
impl UsageIndex for StaticUsageIndex {
    async fn get_outbound_references(
        &self,
        identifier: &str,
        _scope: Scope,
        _version_label: &str,
    ) -> anyhow::Result<Vec<EntityReference>> {
        Ok(self.outbound.get(identifier).cloned().unwrap_or_default())
    }
}

/// Direct extractor contributing a fixed reference list.
pub struct FixedDirectRefs(pub Vec<EntityReference>);

impl FixedDirectRefs {
    pub fn none() -> Self {
        Self(Vec::new())
    }
}

#[async_trait]
impl DirectReferenceExtractor for FixedDirectRefs {
    async fn extract(
        &self,
        _ctx: &DocumentContext,
        _document: &Node,
    ) -> anyhow::Result<Vec<EntityReference>> {
        Ok(self.0.clone())
    }
}

/// Event bus recording every published event.
#[derive(Default)]
pub struct RecordingBus {
    pub events: Mutex<Vec<UsageEvent>>,
}

#[async_trait]
impl EventBus for RecordingBus {
    async fn publish(&self, event: UsageEvent) -> anyhow::Result<()> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}
