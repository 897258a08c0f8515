//! End-to-end reference extraction over in-memory collaborators.

mod common;

use common::{ctx, template, FixedDirectRefs, InMemoryStore, StaticUsageIndex};
use template_core::references::ReferenceExtractor;
use template_core::{
    EntityReference, EntityType, IdentifierRef, Path, Scope, TemplateError,
};

fn runtime_input(entity_type: EntityType, rel_path: &str) -> EntityReference {
    EntityReference {
        entity_type,
        identifier_ref: IdentifierRef::deferred(&ctx(), "<+input>"),
        anchor_path: Path::parse(rel_path),
        value: "<+input>".to_string(),
        is_expression: true,
    }
}

#[tokio::test]
async fn invocation_without_version_resolves_the_default_and_anchors_above_it() {
    let mut store = InMemoryStore::new();
    for version in ["v3", "v9"] {
        let mut entity = template("myTemplate", version, "stage:\n  spec:\n    command: run\n");
        entity.scope = Scope::Account;
        store.insert(entity);
    }
    store.set_default("myTemplate", Scope::Account, "v9");
    let index = StaticUsageIndex::new();
    let direct = FixedDirectRefs::none();
    let extractor = ReferenceExtractor::new(&store, &index, &direct);

    let refs = extractor
        .extract_references(
            &ctx(),
            "a:\n  b:\n    template:\n      templateRef: account.myTemplate\n",
        )
        .await
        .unwrap();

    assert_eq!(refs.len(), 1);
    assert_eq!(refs[0].entity_type, EntityType::Template);
    assert_eq!(refs[0].anchor_path, Path::parse("a.b"));
    assert_eq!(refs[0].value, "account.myTemplate");
    assert_eq!(refs[0].identifier_ref.identifier, "myTemplate");
    assert_eq!(refs[0].identifier_ref.scope, Some(Scope::Account));
    assert_eq!(refs[0].identifier_ref.org_id, None);
    assert_eq!(refs[0].identifier_ref.project_id, None);
}

#[tokio::test]
async fn explicit_stable_label_still_uses_the_default_version() {
    let mut store = InMemoryStore::new();
    store.insert(template("myTemplate", "v2", "stage:\n  spec:\n    command: run\n"));
    let index = StaticUsageIndex::new();
    let direct = FixedDirectRefs::none();
    let extractor = ReferenceExtractor::new(&store, &index, &direct);

    let refs = extractor
        .extract_references(
            &ctx(),
            "a:\n  template:\n    templateRef: myTemplate\n    versionLabel: stable\n",
        )
        .await
        .unwrap();
    assert_eq!(refs.len(), 1);
    assert_eq!(refs[0].anchor_path, Path::parse("a"));
}

#[tokio::test]
async fn nested_runtime_inputs_are_reanchored_into_this_document() {
    let mut store = InMemoryStore::new();
    store.insert(template("deploy", "v1", "stage:\n  spec:\n    serviceRef: <+input>\n"));
    let mut index = StaticUsageIndex::new();
    index.record(
        "deploy",
        vec![
            runtime_input(
                EntityType::Service,
                "template.templateInputs.stage.spec.serviceRef",
            ),
            // A fixed nested reference stays the template's own concern.
            EntityReference {
                entity_type: EntityType::Connector,
                identifier_ref: IdentifierRef::within(&ctx(), Scope::Project, "dockerHub"),
                anchor_path: Path::parse("template.templateInputs.stage.spec.connectorRef"),
                value: "dockerHub".to_string(),
                is_expression: false,
            },
        ],
    );
    let direct = FixedDirectRefs::none();
    let extractor = ReferenceExtractor::new(&store, &index, &direct);

    let yaml = "pipeline:\n  stages:\n    - stage:\n        template:\n          templateRef: deploy\n          versionLabel: v1\n          templateInputs:\n            stage:\n              spec:\n                serviceRef: org.checkout\n";
    let refs = extractor.extract_references(&ctx(), yaml).await.unwrap();

    assert_eq!(refs.len(), 2);
    assert_eq!(refs[0].entity_type, EntityType::Template);
    assert_eq!(refs[1].entity_type, EntityType::Service);
    assert_eq!(
        refs[1].anchor_path,
        Path::parse(
            "pipeline.stages.0.stage.template.templateInputs.stage.spec.serviceRef"
        )
    );
    assert_eq!(refs[1].identifier_ref.identifier, "checkout");
    assert_eq!(refs[1].identifier_ref.scope, Some(Scope::Org));
    assert_eq!(refs[1].identifier_ref.project_id, None);
}

#[tokio::test]
async fn multi_entity_arrays_yield_one_reference_per_element() {
    let mut store = InMemoryStore::new();
    store.insert(template("multiEnv", "v1", "stage:\n  spec:\n    environments:\n      values: <+input>\n"));
    let mut index = StaticUsageIndex::new();
    index.record(
        "multiEnv",
        vec![runtime_input(
            EntityType::Environment,
            "template.templateInputs.stage.spec.environments.values",
        )],
    );
    let direct = FixedDirectRefs::none();
    let extractor = ReferenceExtractor::new(&store, &index, &direct);

    let yaml = "stage:\n  template:\n    templateRef: multiEnv\n    versionLabel: v1\n    templateInputs:\n      stage:\n        spec:\n          environments:\n            values:\n              - environmentRef: dev\n              - environmentRef: account.shared\n";
    let refs = extractor.extract_references(&ctx(), yaml).await.unwrap();

    assert_eq!(refs.len(), 3);
    let anchors: Vec<String> = refs[1..].iter().map(|r| r.anchor_path.dotted()).collect();
    assert_eq!(
        anchors,
        [
            "stage.template.templateInputs.stage.spec.environments.values.0",
            "stage.template.templateInputs.stage.spec.environments.values.1",
        ]
    );
    assert_eq!(refs[1].identifier_ref.identifier, "dev");
    assert_eq!(refs[2].identifier_ref.identifier, "shared");
    assert_eq!(refs[2].identifier_ref.scope, Some(Scope::Account));
    assert_eq!(refs[2].identifier_ref.org_id, None);
}

#[tokio::test]
async fn expression_values_are_tagged_with_deferred_scope() {
    let mut store = InMemoryStore::new();
    store.insert(template("deploy", "v1", "stage:\n  spec:\n    serviceRef: <+input>\n"));
    let mut index = StaticUsageIndex::new();
    index.record(
        "deploy",
        vec![runtime_input(
            EntityType::Service,
            "template.templateInputs.stage.spec.serviceRef",
        )],
    );
    let direct = FixedDirectRefs::none();
    let extractor = ReferenceExtractor::new(&store, &index, &direct);

    let yaml = "stage:\n  template:\n    templateRef: deploy\n    versionLabel: v1\n    templateInputs:\n      stage:\n        spec:\n          serviceRef: <+pipeline.variables.svc>\n";
    let refs = extractor.extract_references(&ctx(), yaml).await.unwrap();

    assert_eq!(refs.len(), 2);
    assert!(refs[1].is_expression);
    assert_eq!(refs[1].identifier_ref.scope, None);
    assert_eq!(refs[1].value, "<+pipeline.variables.svc>");
}

#[tokio::test]
async fn direct_references_come_first() {
    let mut store = InMemoryStore::new();
    store.insert(template("deploy", "v1", "stage:\n  spec:\n    command: run\n"));
    let index = StaticUsageIndex::new();
    let direct = FixedDirectRefs(vec![EntityReference {
        entity_type: EntityType::Connector,
        identifier_ref: IdentifierRef::within(&ctx(), Scope::Project, "gitConnector"),
        anchor_path: Path::parse("pipeline.properties.ci.codebase.connectorRef"),
        value: "gitConnector".to_string(),
        is_expression: false,
    }]);
    let extractor = ReferenceExtractor::new(&store, &index, &direct);

    let yaml = "pipeline:\n  stages:\n    - stage:\n        template:\n          templateRef: deploy\n          versionLabel: v1\n";
    let refs = extractor.extract_references(&ctx(), yaml).await.unwrap();

    assert_eq!(refs.len(), 2);
    assert_eq!(refs[0].entity_type, EntityType::Connector);
    assert_eq!(refs[1].entity_type, EntityType::Template);
}

#[tokio::test]
async fn unresolvable_invocation_is_fatal() {
    let store = InMemoryStore::new();
    let index = StaticUsageIndex::new();
    let direct = FixedDirectRefs::none();
    let extractor = ReferenceExtractor::new(&store, &index, &direct);

    let err = extractor
        .extract_references(&ctx(), "a:\n  template:\n    templateRef: ghost\n")
        .await
        .unwrap_err();
    let core = err.downcast::<TemplateError>().unwrap();
    assert!(matches!(core, TemplateError::TemplateNotFound { .. }));
}
