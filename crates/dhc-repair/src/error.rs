//! # Error Types
//!
//! Failures that stop a repair run. A document that is still invalid after
//! repair is not an error; it is reported through
//! [`RepairOutcome`](crate::RepairOutcome).

use dhc_core::{DhcError, SchemaVersion};
use dhc_schema::SchemaValidationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepairError {
    /// Migration target is not a known CHA version.
    #[error("cannot migrate to version {0}: supported targets are 1.0.0 and 2.0.0")]
    UnsupportedVersion(SchemaVersion),

    /// The document declares a CHA version other than 1.0.0 or 2.0.0.
    #[error("cannot migrate from version {0}: only 1.0.0 and 2.0.0 are known")]
    UnknownSourceVersion(SchemaVersion),

    /// The document's contract could not be determined.
    #[error("cannot tell which contract {0} follows; pass the contract explicitly")]
    UnknownContract(String),

    /// Migration applies to CHA output only.
    #[error("{0} documents have a single version and cannot be migrated")]
    NotMigratable(dhc_core::ContractKind),

    /// Schema loading or compilation failed.
    #[error(transparent)]
    Schema(#[from] SchemaValidationError),

    /// A core primitive failed (path write, version parse).
    #[error(transparent)]
    Core(#[from] DhcError),
}
