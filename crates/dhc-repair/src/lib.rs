//! # dhc-repair — Local Repair of Output Documents
//!
//! Producers of CHA, KPI and LFA output drift from the published contracts
//! in predictable ways: numbers serialized as strings, enum values spelled
//! the way a solver or a German-language engineer spells them, sections
//! that v1 documents never had. This crate fixes what can be fixed without
//! guessing, then hands the document back to the validator.
//!
//! ## Steps
//!
//! Applied in this order by [`RepairPipeline`], each toggled by
//! [`RepairOptions`]:
//!
//! 1. **Migrate** — CHA v1 documents are upgraded to v2 ([`migrate`]).
//! 2. **Normalize enums** — synonyms and case variants are mapped onto the
//!    schema's `enum` members ([`enums`]).
//! 3. **Coerce types** — numeric and boolean strings become numbers and
//!    booleans where the schema asks for them ([`coerce`]).
//! 4. **Insert defaults** — missing units, CRS, compliance and version
//!    fields are filled in ([`defaults`]).
//!
//! Every change is recorded as a [`RepairAction`]. Values that cannot be
//! repaired are left untouched for re-validation to report.

pub mod action;
pub mod coerce;
pub mod defaults;
pub mod enums;
pub mod error;
pub mod migrate;
pub mod pipeline;
mod walk;

pub use action::{RepairAction, RepairStep};
pub use coerce::coerce_types;
pub use defaults::{insert_defaults, DefaultValues};
pub use enums::{normalize_enums, normalize_token, EnumNormalizer, SynonymTable};
pub use error::RepairError;
pub use migrate::{
    detect_cha_version, downgrade_v2_to_v1, migrate, upgrade_v1_to_v2, MigrationLog,
};
pub use pipeline::{RepairOptions, RepairOutcome, RepairPipeline};
