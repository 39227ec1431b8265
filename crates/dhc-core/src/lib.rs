//! # dhc-core — Foundational Types for District-Heating Contracts
//!
//! Leaf crate of the workspace. Defines the vocabulary every other crate
//! speaks when it loads, validates, repairs or migrates a simulation output
//! document.
//!
//! ## Key Design Principles
//!
//! 1. **One enum per closed value set.** `ConvergenceStatus`,
//!    `ComplianceStatus`, `PipeCircuit`, `NodeType` and `PreferredOption`
//!    mirror the `enum` keywords of the JSON Schema contracts. Adding a value
//!    to a schema forces the matching enum to change.
//!
//! 2. **Contracts are named, not stringly typed.** [`ContractKind`] carries
//!    the schema filename, `$id` URI and current version of each contract.
//!
//! 3. **Dotted paths are parsed once.** [`FieldPath`] is the only way the
//!    workspace addresses a field inside a document
//!    (`kpis.hydraulic.max_velocity_ms`, `pipes[0].id`).
//!
//! 4. **UTC-only timestamps.** [`Timestamp`] renders `YYYY-MM-DDTHH:MM:SSZ`,
//!    the form the contracts' `date-time` fields are written in.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `dhc-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod contract;
pub mod domain;
pub mod error;
pub mod path;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use contract::{ContractKind, SchemaVersion, SCHEMA_URI_PREFIX};
pub use domain::{ComplianceStatus, ConvergenceStatus, NodeType, PipeCircuit, PreferredOption};
pub use error::DhcError;
pub use path::{missing_fields, FieldPath, PathSegment};
pub use temporal::Timestamp;
