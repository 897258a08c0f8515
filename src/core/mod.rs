//! Core types and error handling for template-core.
//!
//! This module defines the crate's shared vocabulary:
//!
//! - [`TemplateError`] - the strongly-typed error taxonomy for all fatal
//!   failure modes (malformed input, runaway nesting, missing templates,
//!   collaborator failures)
//! - [`Scope`], [`EntityType`], [`SyntaxVersion`] - closed enums describing
//!   where entities live and what they are
//! - [`TemplateRef`] - a parsed template invocation extracted from a document
//! - [`TemplateEntity`] - an immutable fetched template, cached per request
//! - [`EntityReference`] / [`IdentifierRef`] - path-addressed references to
//!   external entities, the unit of usage publishing
//!
//! Non-fatal validation failures are deliberately *not* errors: a schema
//! incompatibility is recorded in the
//! [`ValidationResult`](crate::validation::ValidationResult) so every problem
//! in a document can be reported at once.

mod error;
mod types;

pub use error::TemplateError;
pub use types::{
    DocumentContext, EntityReference, IdentifierRef, EntityType, Scope, SyntaxVersion,
    TemplateEntity, TemplateRef, TemplateSummary,
};
