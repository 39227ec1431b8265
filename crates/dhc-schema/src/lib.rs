//! # dhc-schema — Output Contract Validation
//!
//! Runtime JSON Schema validation for the documents a district-heating
//! simulation run produces: CHA output, KPI summary and LFA demand.
//!
//! ## Responsibilities
//!
//! - **Contracts:** the draft-07 schemas in `schemas/` are embedded at
//!   compile time ([`contracts`]) so the validator works without a checkout.
//!   A schema directory can be loaded instead to test schema changes.
//!
//! - **Validation:** [`SchemaValidator`] resolves cross-schema `$ref`s to
//!   `common.schema.json` locally, caches compiled validators, and returns a
//!   [`ValidationReport`] with one [`Violation`] per problem, addressed by
//!   dotted path and classified as missing / wrong type / not in enum /
//!   out of range.
//!
//! - **Schema lint:** [`lint`] checks the schema documents themselves
//!   (`$schema`, `$id`, `type`, `properties`, `version`, `required` entries
//!   that name undeclared properties) and that the schema `enum` sets still
//!   match the value sets in `dhc-core`.
//!
//! - **Downstream consumers:** [`consumers`] checks the dotted fields EAA and
//!   TCA read from CHA output, and the non-negativity of KPI numbers.
//!
//! ## Crate Policy
//!
//! - Depends only on `dhc-core` internally.
//! - Schema `$id` URIs must not change without bumping the contract version.
//! - No network access: unresolved `$ref` URIs are errors.

pub mod consumers;
pub mod contracts;
pub mod lint;
pub mod validate;

pub use consumers::{check_consumer, check_non_negative_kpis, Consumer, ConsumerIssue, IssueKind};
pub use contracts::{export_schemas, EmbeddedSchema, EMBEDDED_SCHEMAS};
pub use lint::{check_enum_bindings, lint_all, lint_schema, EnumBinding, LintFinding, LintSeverity, ENUM_BINDINGS};
pub use validate::{
    load_document, SchemaSource, SchemaValidationError, SchemaValidator, ValidationReport,
    Violation, ViolationKind,
};
