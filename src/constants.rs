//! Reserved field names and limits used throughout the template core.
//!
//! The template-invocation shape, the identifier fields touched by the
//! injector, and the nesting limit are all fixed protocol-level names.
//! Defining them centrally keeps the walkers and rebuilders in agreement.

/// Reserved field marking an object node as a template invocation.
pub const TEMPLATE_FIELD: &str = "template";

/// Field inside [`TEMPLATE_FIELD`] holding the target template identifier.
pub const TEMPLATE_REF_FIELD: &str = "templateRef";

/// Optional field inside [`TEMPLATE_FIELD`] selecting an explicit version.
pub const VERSION_LABEL_FIELD: &str = "versionLabel";

/// Optional field inside [`TEMPLATE_FIELD`] carrying the caller-supplied
/// runtime inputs.
pub const TEMPLATE_INPUTS_FIELD: &str = "templateInputs";

/// Sentinel version label meaning "use the scope's designated default
/// version". An absent `versionLabel` means the same thing.
pub const STABLE_VERSION: &str = "stable";

/// Maximum template nesting depth before an operation aborts.
///
/// This is a cycle-safety valve, not a precise cycle detector: a long but
/// non-cyclic template chain of the same length also fails. The counter
/// increments only when an engine recurses into a resolved template body,
/// never for ordinary object/array nesting.
pub const MAX_NESTING_DEPTH: usize = 10;

/// Literal value marking a field as a runtime input to be supplied by the
/// referencing document.
pub const RUNTIME_INPUT_MARKER: &str = "<+input>";

/// Prefix shared by all runtime expressions, including [`RUNTIME_INPUT_MARKER`].
pub const EXPRESSION_PREFIX: &str = "<+";

/// Field paths excluded from the schema-compatibility check.
///
/// These subtrees are filled in per-execution rather than per-reference, so
/// a shape mismatch there is expected and must not fail validation.
pub const COMPAT_IGNORED_PATHS: &[&str] = &[
    "service.serviceInputs",
    "environment.environmentInputs",
    "environment.serviceOverrideInputs",
    "codebase.repoName",
];

/// V0 identifier field name.
pub const IDENTIFIER_FIELD: &str = "identifier";

/// V1 identifier field name (also the stray field dropped on V0 targets).
pub const ID_FIELD: &str = "id";

/// Display-name field used to derive injected identifiers.
pub const NAME_FIELD: &str = "name";

/// Type-discriminator field, the fallback source for injected identifiers.
pub const TYPE_FIELD: &str = "type";

/// Injected node UUID field, skipped by the variable indexer.
pub const UUID_FIELD: &str = "uuid";

/// Per-element value field indexed for keyed array elements.
pub const VALUE_FIELD: &str = "value";
