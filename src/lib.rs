//! template-core - resolution, validation, and usage indexing for template
//! references embedded in pipeline-as-code YAML documents.
//!
//! A document may contain nodes that say "expand template X at version V
//! with these inputs"; such nodes may themselves expand to documents that
//! contain further template nodes, nested to a bounded depth. This crate:
//!
//! - recursively discovers every template node in a document,
//! - validates that the inputs supplied at each node are structurally
//!   compatible with the referenced template's declared parameter shape,
//! - regenerates (refreshes) those inputs when the template's shape changed,
//! - computes the full transitive set of external entities a document
//!   depends on, expressed as path-addressed references, and
//! - publishes that reference set as who-depends-on-whom edges for a
//!   downstream usage-tracking index.
//!
//! # Architecture
//!
//! All operations are synchronous-per-request and recursive; the only
//! suspension points are awaited collaborator calls. There is no shared
//! mutable state across requests: the template cache and the injector's
//! identifier/suffix maps are request-scoped values threaded explicitly
//! through calls. The single built-in abort mechanism is the fixed
//! template-nesting limit of [`constants::MAX_NESTING_DEPTH`].
//!
//! # Core Modules
//!
//! - [`node`] - the generic document tree ([`node::Node`]), canonical path
//!   addressing ([`node::Path`]), and the flattened per-document path index
//! - [`walker`] - depth-first template-node discovery with the depth guard
//! - [`resolver`] - template entity resolution with a request-scoped cache
//! - [`validation`] - runtime-input validation and the diagnostic error tree
//! - [`refresh`] - runtime-input regeneration against current template shapes
//! - [`expand`] - template substitution for reconciliation round trips
//! - [`references`] - transitive entity-reference extraction
//! - [`usage`] - usage-edge publishing with delete-and-replace semantics
//! - [`inject`] - deterministic node identifier injection
//! - [`variables`] - UUID -> address indexing for expression support
//!
//! # Supporting Modules
//!
//! - [`core`] - shared types and the [`core::TemplateError`] taxonomy
//! - [`external`] - contracts for every collaborator this core is built on
//!   (template store, schema checker, reconciliation service, usage index,
//!   event bus); the crate owns no transport, auth, or storage itself
//! - [`constants`] - reserved field names and limits
//!
//! # Example
//!
//! ```no_run
//! use template_core::validation::InputValidationEngine;
//! # async fn example(
//! #     store: &dyn template_core::external::TemplateStore,
//! #     checker: &dyn template_core::external::SchemaCompatibilityChecker,
//! #     reconciliation: &dyn template_core::external::ReconciliationClient,
//! # ) -> anyhow::Result<()> {
//! let engine = InputValidationEngine::new(store, checker, reconciliation);
//! let result = engine.validate("pipeline:\n  name: Deploy\n").await?;
//! if !result.valid {
//!     for node in &result.error_nodes {
//!         println!("{node:?}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod constants;
pub mod core;
pub mod expand;
pub mod external;
pub mod inject;
pub mod node;
pub mod references;
pub mod refresh;
pub mod resolver;
pub mod usage;
pub mod validation;
pub mod variables;
pub mod walker;

pub use self::core::{
    DocumentContext, EntityReference, EntityType, IdentifierRef, Scope, SyntaxVersion,
    TemplateEntity, TemplateError, TemplateRef, TemplateSummary,
};
pub use node::{Node, Path};
pub use validation::ValidationResult;
