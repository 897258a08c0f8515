//! Error types for template resolution, validation, and indexing.
//!
//! All fatal failure modes are variants of [`TemplateError`]. Fatal errors
//! abort the entire top-level operation; there is no partial validation or
//! refresh result on a fatal path. Schema incompatibilities are not errors -
//! they complete the operation with a `valid = false` verdict and a full
//! diagnostic tree so callers can render every problem at once.
//!
//! Engines return [`anyhow::Result`] and attach call-site context with
//! `.context()`; callers that need to branch on a specific failure mode can
//! downcast to [`TemplateError`].

use thiserror::Error;

use crate::core::Scope;

/// The error taxonomy for all fatal template-core failures.
#[derive(Error, Debug)]
pub enum TemplateError {
    /// The input document could not be parsed into a tree, or was empty.
    ///
    /// Surfaced immediately with no partial result.
    #[error("malformed document: {reason}")]
    MalformedDocument {
        /// Why the document was rejected.
        reason: String,
    },

    /// Template nesting reached the fixed depth limit.
    ///
    /// This is a cycle-safety valve: a reference cycle between templates
    /// expands forever, so any chain reaching the limit is treated as
    /// runaway nesting and aborts the whole operation.
    #[error(
        "template nesting reached {limit} levels: runaway template nesting, \
         the document likely contains a template reference cycle"
    )]
    RecursionLimitExceeded {
        /// The fixed nesting limit that was reached.
        limit: usize,
    },

    /// No stored template matched the reference.
    #[error("template '{identifier}' not found in {scope} scope (version: {})", version_label.as_deref().unwrap_or("stable"))]
    TemplateNotFound {
        /// The referenced template identifier.
        identifier: String,
        /// The scope the identifier was resolved against.
        scope: Scope,
        /// The explicit version label, if one was given.
        version_label: Option<String>,
    },

    /// An outbound collaborator call failed.
    ///
    /// Propagated as fatal everywhere except the delete-edges publish, which
    /// is logged and suppressed by the usage publisher.
    #[error("{service} call failed: {reason}")]
    ExternalService {
        /// Which collaborator failed (store, reconciliation, event bus, ...).
        service: String,
        /// The underlying failure description.
        reason: String,
    },

    /// YAML (de)serialization failed outside of initial document parsing.
    #[error("YAML processing failed: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
